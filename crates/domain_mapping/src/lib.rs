//! Record Mapping Domain
//!
//! This crate translates records between the portal's data model and the
//! CRM's record model. Each portal entity type declares a [`MappingSpec`]:
//!
//! - **Fields**: plain aliases, portal key to CRM field name
//! - **Enums**: codes translated through an [`EnumCodec`], either a straight
//!   table ([`EqualCodec`]) or custom logic ([`DifferentCodec`])
//! - **Lookups**: relations resolved by external identifier through the
//!   [`LookupResolver`], including polymorphic relations
//!
//! [`RecordTranslator`] applies a spec in both directions.
//!
//! # Examples
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use domain_mapping::{CrmRecord, EqualCodec, LookupResolver, MappingSpec, RecordTranslator};
//!
//! const TASK: EntityType = EntityType::new("task");
//!
//! let spec = MappingSpec::builder(TASK, "Tasks")
//!     .field("subject", "Subject")
//!     .equal_enum("status", "Status", Arc::new(
//!         EqualCodec::new("status").entry(1, "inactive").entry(2, "active"),
//!     ))
//!     .build()?;
//!
//! let translator = RecordTranslator::new(Arc::new(spec), LookupResolver::new(store));
//!
//! let record = CrmRecord::new(ExternalId::new("T-1")?)
//!     .with_field("Subject", "Call back")
//!     .with_field("Status", 2);
//! let parsed = translator.crm_to_portal(&record).await?;
//!
//! assert_eq!(parsed["status"], json!("active"));
//! ```

pub mod value;
pub mod codec;
pub mod spec;
pub mod ports;
pub mod lookup;
pub mod translator;
pub mod error;

pub use value::{
    CrmFieldMap, CrmRecord, EntityRef, ParsedRecord, PortalEntity, PortalInput, Supplied,
    EXTERNAL_ID_KEY, SECONDARY_DATA_KEY,
};
pub use codec::{DifferentCodec, EnumCodec, EqualCodec};
pub use spec::{
    EnumRepresentation, EnumRule, FieldMapping, LookupMapping, LookupRule, LookupTarget,
    MappingSpec, MappingSpecBuilder, PolymorphicAlternative,
};
pub use ports::EntityStorePort;
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockEntityStore;
pub use lookup::{LookupResolver, Resolution};
pub use translator::RecordTranslator;
pub use error::MappingError;
