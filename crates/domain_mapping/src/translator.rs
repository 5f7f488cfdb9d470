//! Record translation
//!
//! [`RecordTranslator`] applies one [`MappingSpec`] to whole records:
//!
//! - `crm_to_portal` always writes every key the spec declares, null when the
//!   CRM record has nothing for it
//! - `portal_to_crm` only writes the CRM fields the input determined, so an
//!   update never clears a field the caller did not mention

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::MappingError;
use crate::lookup::{LookupResolver, Resolution};
use crate::spec::{EnumRepresentation, LookupRule, MappingSpec};
use crate::value::{CrmFieldMap, CrmRecord, ParsedRecord, PortalInput, Supplied, EXTERNAL_ID_KEY};

const REPRESENTATIONS: [EnumRepresentation; 2] =
    [EnumRepresentation::Equal, EnumRepresentation::Different];

/// Translates records of one entity type between portal and CRM shapes
#[derive(Clone)]
pub struct RecordTranslator {
    spec: Arc<MappingSpec>,
    resolver: LookupResolver,
}

impl RecordTranslator {
    pub fn new(spec: Arc<MappingSpec>, resolver: LookupResolver) -> Self {
        Self { spec, resolver }
    }

    pub fn spec(&self) -> &MappingSpec {
        &self.spec
    }

    /// Translates a CRM record into a portal-shaped record
    pub async fn crm_to_portal(&self, record: &CrmRecord) -> Result<ParsedRecord, MappingError> {
        let mut parsed = ParsedRecord::new();
        parsed.insert(
            EXTERNAL_ID_KEY.to_string(),
            Value::String(record.id.as_str().to_string()),
        );

        for field in self.spec.fields() {
            let value = record.field(&field.crm_key).cloned().unwrap_or(Value::Null);
            parsed.insert(field.portal_key.clone(), value);
        }

        for representation in REPRESENTATIONS {
            for rule in self.spec.enums(representation) {
                let value = match record.field(&rule.crm_key) {
                    Some(crm_value) if !crm_value.is_null() => rule.codec.to_portal(crm_value)?,
                    _ => Value::Null,
                };
                parsed.insert(rule.portal_key.clone(), value);
            }
        }

        for lookup in self.spec.lookups() {
            let value = match &lookup.rule {
                LookupRule::Single(target) => {
                    self.resolver
                        .resolve_to_portal(target, record.field(&target.crm_key))
                        .await?
                }
                LookupRule::Polymorphic(alternatives) => {
                    self.resolver
                        .resolve_polymorphic_to_portal(alternatives, record)
                        .await?
                }
            };
            parsed.insert(lookup.portal_key.clone(), value);
        }

        debug!(
            module = self.spec.module(),
            crm_id = %record.id,
            keys = parsed.len(),
            "Translated CRM record to portal shape"
        );
        Ok(parsed)
    }

    /// Translates portal input into the CRM field values it determines
    pub async fn portal_to_crm(&self, input: &PortalInput) -> Result<CrmFieldMap, MappingError> {
        let mut fields = CrmFieldMap::new();

        for field in self.spec.fields() {
            match input.supplied(&field.portal_key) {
                Supplied::Direct(value) | Supplied::Secondary(value) => {
                    fields.insert(field.crm_key.clone(), value.clone());
                }
                Supplied::ExplicitNull => {
                    fields.insert(field.crm_key.clone(), Value::Null);
                }
                Supplied::Absent => {}
            }
        }

        for representation in REPRESENTATIONS {
            for rule in self.spec.enums(representation) {
                match input.supplied(&rule.portal_key) {
                    Supplied::Direct(value) | Supplied::Secondary(value) => {
                        fields.insert(rule.crm_key.clone(), rule.codec.to_crm(value)?);
                    }
                    Supplied::ExplicitNull => {
                        fields.insert(rule.crm_key.clone(), Value::Null);
                    }
                    Supplied::Absent => {}
                }
            }
        }

        for lookup in self.spec.lookups() {
            match &lookup.rule {
                LookupRule::Single(target) => {
                    let resolution = self
                        .resolver
                        .resolve_to_crm(&lookup.portal_key, target, input)
                        .await?;
                    if let Resolution::Write(value) = resolution {
                        fields.insert(target.crm_key.clone(), value);
                    }
                }
                LookupRule::Polymorphic(alternatives) => {
                    let resolved = self
                        .resolver
                        .resolve_polymorphic_to_crm(alternatives, input)
                        .await?;
                    fields.extend(resolved);
                }
            }
        }

        debug!(
            module = self.spec.module(),
            fields = fields.len(),
            "Translated portal input to CRM fields"
        );
        Ok(fields)
    }
}
