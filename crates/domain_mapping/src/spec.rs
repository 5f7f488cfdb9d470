//! Mapping specifications
//!
//! A [`MappingSpec`] declares, for one portal entity type, how its fields,
//! enumerations and relations correspond to a CRM module. Specs are built
//! once at startup through [`MappingSpecBuilder`], which rejects duplicate
//! keys, and are shared immutably afterwards.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use core_kernel::EntityType;
//! use domain_mapping::{EqualCodec, LookupTarget, MappingSpec};
//!
//! const ACCOUNT: EntityType = EntityType::new("account");
//! const CONTACT: EntityType = EntityType::new("contact");
//!
//! let spec = MappingSpec::builder(CONTACT, "Contacts")
//!     .field("first_name", "First_Name")
//!     .field("last_name", "Last_Name")
//!     .equal_enum("status", "Status", Arc::new(
//!         EqualCodec::new("status").entry(1, "inactive").entry(2, "active"),
//!     ))
//!     .lookup("account_id", LookupTarget::related(ACCOUNT, "Account_Name"))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(spec.module(), "Contacts");
//! assert_eq!(spec.output_keys().count(), 5);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use core_kernel::EntityType;

use crate::codec::EnumCodec;
use crate::error::MappingError;
use crate::value::EXTERNAL_ID_KEY;

/// A plain field alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub portal_key: String,
    pub crm_key: String,
}

/// Which codec contract an enum rule uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumRepresentation {
    /// Same semantics on both sides, different codes
    Equal,
    /// Distinct vocabularies with custom translation
    Different,
}

/// An enumerated field translated through a codec
#[derive(Clone)]
pub struct EnumRule {
    pub portal_key: String,
    pub crm_key: String,
    pub codec: Arc<dyn EnumCodec>,
}

impl fmt::Debug for EnumRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumRule")
            .field("portal_key", &self.portal_key)
            .field("crm_key", &self.crm_key)
            .field("codec", &self.codec.name())
            .finish()
    }
}

/// The CRM side of a relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTarget {
    /// Portal entity type the relation points at; `None` for raw passthrough
    pub related: Option<EntityType>,
    pub crm_key: String,
}

impl LookupTarget {
    /// A relation resolved through the related entity's external identifier
    pub fn related(entity_type: EntityType, crm_key: impl Into<String>) -> Self {
        Self {
            related: Some(entity_type),
            crm_key: crm_key.into(),
        }
    }

    /// A relation whose value is copied without any lookup
    pub fn passthrough(crm_key: impl Into<String>) -> Self {
        Self {
            related: None,
            crm_key: crm_key.into(),
        }
    }
}

/// One alternative of a polymorphic relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolymorphicAlternative {
    /// Portal key holding the related entity for this alternative
    pub portal_key: String,
    pub target: LookupTarget,
}

/// How a relation field is translated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupRule {
    Single(LookupTarget),
    /// Mutually exclusive alternatives sharing one portal key, in declaration order
    Polymorphic(Vec<PolymorphicAlternative>),
}

/// A lookup rule keyed by its portal output key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupMapping {
    pub portal_key: String,
    pub rule: LookupRule,
}

/// Declarative mapping between one portal entity type and one CRM module
#[derive(Debug, Clone)]
pub struct MappingSpec {
    entity_type: EntityType,
    module: String,
    fields: Vec<FieldMapping>,
    equal_enums: Vec<EnumRule>,
    different_enums: Vec<EnumRule>,
    lookups: Vec<LookupMapping>,
}

impl MappingSpec {
    pub fn builder(entity_type: EntityType, module: impl Into<String>) -> MappingSpecBuilder {
        MappingSpecBuilder {
            spec: MappingSpec {
                entity_type,
                module: module.into(),
                fields: Vec::new(),
                equal_enums: Vec::new(),
                different_enums: Vec::new(),
                lookups: Vec::new(),
            },
        }
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// CRM module name, e.g. `Contacts`
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn fields(&self) -> &[FieldMapping] {
        &self.fields
    }

    pub fn enums(&self, representation: EnumRepresentation) -> &[EnumRule] {
        match representation {
            EnumRepresentation::Equal => &self.equal_enums,
            EnumRepresentation::Different => &self.different_enums,
        }
    }

    pub fn lookups(&self) -> &[LookupMapping] {
        &self.lookups
    }

    /// Every key a CRM-to-portal translation writes, external id first
    pub fn output_keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(EXTERNAL_ID_KEY)
            .chain(self.fields.iter().map(|f| f.portal_key.as_str()))
            .chain(self.equal_enums.iter().map(|r| r.portal_key.as_str()))
            .chain(self.different_enums.iter().map(|r| r.portal_key.as_str()))
            .chain(self.lookups.iter().map(|l| l.portal_key.as_str()))
    }

    fn crm_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.fields.iter().map(|f| f.crm_key.as_str()).collect();
        keys.extend(self.equal_enums.iter().map(|r| r.crm_key.as_str()));
        keys.extend(self.different_enums.iter().map(|r| r.crm_key.as_str()));
        for lookup in &self.lookups {
            match &lookup.rule {
                LookupRule::Single(target) => keys.push(&target.crm_key),
                LookupRule::Polymorphic(alternatives) => {
                    keys.extend(alternatives.iter().map(|a| a.target.crm_key.as_str()))
                }
            }
        }
        keys
    }

    fn validate(&self) -> Result<(), MappingError> {
        let mut portal_keys = HashSet::new();
        for key in self.output_keys() {
            if !portal_keys.insert(key) {
                return Err(self.invalid(format!("portal key '{}' is mapped more than once", key)));
            }
        }

        let mut crm_keys = HashSet::new();
        for key in self.crm_keys() {
            if !crm_keys.insert(key) {
                return Err(self.invalid(format!("CRM key '{}' is written by more than one rule", key)));
            }
        }

        for lookup in &self.lookups {
            if let LookupRule::Polymorphic(alternatives) = &lookup.rule {
                if alternatives.is_empty() {
                    return Err(self.invalid(format!(
                        "polymorphic lookup '{}' declares no alternatives",
                        lookup.portal_key
                    )));
                }
                for alternative in alternatives {
                    if !portal_keys.insert(alternative.portal_key.as_str()) {
                        return Err(self.invalid(format!(
                            "portal key '{}' of polymorphic lookup '{}' is mapped more than once",
                            alternative.portal_key, lookup.portal_key
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    fn invalid(&self, message: String) -> MappingError {
        MappingError::invalid_spec(self.entity_type.as_str(), message)
    }
}

/// Builder for [`MappingSpec`]; declaration order is preserved
#[derive(Debug)]
pub struct MappingSpecBuilder {
    spec: MappingSpec,
}

impl MappingSpecBuilder {
    pub fn field(mut self, portal_key: impl Into<String>, crm_key: impl Into<String>) -> Self {
        self.spec.fields.push(FieldMapping {
            portal_key: portal_key.into(),
            crm_key: crm_key.into(),
        });
        self
    }

    pub fn equal_enum(
        self,
        portal_key: impl Into<String>,
        crm_key: impl Into<String>,
        codec: Arc<dyn EnumCodec>,
    ) -> Self {
        self.enum_rule(EnumRepresentation::Equal, portal_key, crm_key, codec)
    }

    pub fn different_enum(
        self,
        portal_key: impl Into<String>,
        crm_key: impl Into<String>,
        codec: Arc<dyn EnumCodec>,
    ) -> Self {
        self.enum_rule(EnumRepresentation::Different, portal_key, crm_key, codec)
    }

    pub fn enum_rule(
        mut self,
        representation: EnumRepresentation,
        portal_key: impl Into<String>,
        crm_key: impl Into<String>,
        codec: Arc<dyn EnumCodec>,
    ) -> Self {
        let rule = EnumRule {
            portal_key: portal_key.into(),
            crm_key: crm_key.into(),
            codec,
        };
        match representation {
            EnumRepresentation::Equal => self.spec.equal_enums.push(rule),
            EnumRepresentation::Different => self.spec.different_enums.push(rule),
        }
        self
    }

    pub fn lookup(mut self, portal_key: impl Into<String>, target: LookupTarget) -> Self {
        self.spec.lookups.push(LookupMapping {
            portal_key: portal_key.into(),
            rule: LookupRule::Single(target),
        });
        self
    }

    /// Adds a polymorphic lookup from `(portal_key, target)` alternatives
    pub fn polymorphic<K>(
        mut self,
        portal_key: impl Into<String>,
        alternatives: impl IntoIterator<Item = (K, LookupTarget)>,
    ) -> Self
    where
        K: Into<String>,
    {
        let alternatives = alternatives
            .into_iter()
            .map(|(key, target)| PolymorphicAlternative {
                portal_key: key.into(),
                target,
            })
            .collect();
        self.spec.lookups.push(LookupMapping {
            portal_key: portal_key.into(),
            rule: LookupRule::Polymorphic(alternatives),
        });
        self
    }

    pub fn build(self) -> Result<MappingSpec, MappingError> {
        self.spec.validate()?;
        Ok(self.spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::EqualCodec;

    const DEAL: EntityType = EntityType::new("deal");
    const ACCOUNT: EntityType = EntityType::new("account");
    const CONTACT: EntityType = EntityType::new("contact");

    fn stage_codec() -> Arc<dyn EnumCodec> {
        Arc::new(EqualCodec::new("stage").entry("Closed Won", 1).entry("Closed Lost", 2))
    }

    #[test]
    fn test_builder_preserves_declaration_order() {
        let spec = MappingSpec::builder(DEAL, "Deals")
            .field("name", "Deal_Name")
            .field("amount", "Amount")
            .equal_enum("stage", "Stage", stage_codec())
            .polymorphic(
                "owner_id",
                [
                    ("contact", LookupTarget::related(CONTACT, "Contact_Name")),
                    ("account", LookupTarget::related(ACCOUNT, "Account_Name")),
                ],
            )
            .build()
            .unwrap();

        let keys: Vec<_> = spec.output_keys().collect();
        assert_eq!(keys, vec!["crm_id", "name", "amount", "stage", "owner_id"]);
        assert_eq!(spec.enums(EnumRepresentation::Equal).len(), 1);
        assert!(spec.enums(EnumRepresentation::Different).is_empty());
        assert_eq!(spec.entity_type(), DEAL);
    }

    #[test]
    fn test_duplicate_portal_key_is_rejected() {
        let result = MappingSpec::builder(DEAL, "Deals")
            .field("stage", "Deal_Stage")
            .equal_enum("stage", "Stage", stage_codec())
            .build();

        match result {
            Err(MappingError::InvalidSpec { entity_type, message }) => {
                assert_eq!(entity_type, "deal");
                assert!(message.contains("stage"));
            }
            other => panic!("expected InvalidSpec, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_crm_key_is_rejected() {
        let result = MappingSpec::builder(DEAL, "Deals")
            .field("name", "Deal_Name")
            .field("title", "Deal_Name")
            .build();
        assert!(matches!(result, Err(MappingError::InvalidSpec { .. })));

        let result = MappingSpec::builder(DEAL, "Deals")
            .lookup("account_id", LookupTarget::related(ACCOUNT, "Account_Name"))
            .polymorphic("owner_id", [("account", LookupTarget::related(ACCOUNT, "Account_Name"))])
            .build();
        assert!(matches!(result, Err(MappingError::InvalidSpec { .. })));
    }

    #[test]
    fn test_polymorphic_alternative_keys_must_be_unique() {
        let result = MappingSpec::builder(DEAL, "Deals")
            .field("account_id", "Account_Ref")
            .polymorphic(
                "owner_id",
                [
                    ("contact_id", LookupTarget::related(CONTACT, "Contact_Name")),
                    ("account_id", LookupTarget::related(ACCOUNT, "Account_Name")),
                ],
            )
            .build();
        match result {
            Err(MappingError::InvalidSpec { message, .. }) => assert!(message.contains("account_id")),
            other => panic!("expected InvalidSpec, got {:?}", other),
        }

        let result = MappingSpec::builder(DEAL, "Deals")
            .polymorphic(
                "owner_id",
                [
                    ("party", LookupTarget::related(CONTACT, "Contact_Name")),
                    ("party", LookupTarget::related(ACCOUNT, "Account_Name")),
                ],
            )
            .build();
        assert!(matches!(result, Err(MappingError::InvalidSpec { .. })));
    }

    #[test]
    fn test_external_id_key_is_reserved() {
        let result = MappingSpec::builder(DEAL, "Deals").field("crm_id", "Id").build();
        assert!(matches!(result, Err(MappingError::InvalidSpec { .. })));
    }

    #[test]
    fn test_empty_polymorphic_lookup_is_rejected() {
        let result = MappingSpec::builder(DEAL, "Deals")
            .polymorphic("owner_id", Vec::<(&str, LookupTarget)>::new())
            .build();
        assert!(matches!(result, Err(MappingError::InvalidSpec { .. })));
    }

    #[test]
    fn test_enum_rule_debug_names_codec() {
        let spec = MappingSpec::builder(DEAL, "Deals")
            .equal_enum("stage", "Stage", stage_codec())
            .build()
            .unwrap();
        let debug = format!("{:?}", spec.enums(EnumRepresentation::Equal)[0]);
        assert!(debug.contains("\"stage\""));
    }
}
