//! Record Sync Domain
//!
//! Orchestrates single-record create, update, fetch and search calls against
//! an external CRM, translating every record through a
//! [`domain_mapping::RecordTranslator`].
//!
//! # Wiring
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use domain_sync::{telemetry, CrmClient, RecordSyncService, SyncConfig};
//!
//! let config = SyncConfig::from_env()?;
//! telemetry::init_tracing(&config.log_level)?;
//!
//! let client = Arc::new(CrmClient::new(Arc::new(RestCrmAdapter::new(config.connection.clone()))));
//! let contacts = RecordSyncService::new(client.clone(), contact_translator, config.settings());
//! let deals = RecordSyncService::new(client, deal_translator, config.settings());
//! ```

pub mod ports;
pub mod client;
pub mod service;
pub mod config;
pub mod telemetry;
pub mod error;

pub use ports::{CrmRecordPort, Criteria, EntityResponse, ResponseStatus, Trigger};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{CrmCall, MockCrmPort};
pub use client::CrmClient;
pub use service::{RecordSyncService, TERRITORY_FIELD};
pub use config::{ConfigError, CrmConnectionConfig, SyncConfig, SyncSettings};
pub use error::SyncError;
