//! Lookup resolution
//!
//! Relations cross the portal/CRM boundary by external identifier: the portal
//! stores local ids, the CRM stores its own record ids. [`LookupResolver`]
//! converts between the two using the local entity store.
//!
//! # Portal to CRM
//!
//! The local key is taken from the input's direct value, falling back to the
//! secondary data block. A key the input never mentions is left out of the
//! CRM payload entirely ([`Resolution::Omit`]); a key present with null clears
//! the CRM field. The external id then comes from a matching preloaded
//! relation when one exists, otherwise from a store lookup. A relation that
//! cannot be found resolves to null: it may simply not be synced yet.
//!
//! # CRM to portal
//!
//! The CRM's related record id is looked up in the store. When no local entity
//! carries it, the external id itself is returned so the reference is not lost.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::MappingError;
use crate::ports::EntityStorePort;
use crate::spec::{LookupTarget, PolymorphicAlternative};
use crate::value::{
    external_id_from_value, external_id_to_value, local_id_from_value, local_id_to_value,
    CrmRecord, PortalInput, Supplied,
};

/// Outcome of resolving a relation towards the CRM
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The input did not mention the relation; leave the CRM field untouched
    Omit,
    /// Write this value (null clears the CRM field)
    Write(Value),
}

/// Resolves relation fields in both directions against the local entity store
#[derive(Clone)]
pub struct LookupResolver {
    store: Arc<dyn EntityStorePort>,
}

impl LookupResolver {
    pub fn new(store: Arc<dyn EntityStorePort>) -> Self {
        Self { store }
    }

    /// Resolves a single relation from portal input to its CRM value
    pub async fn resolve_to_crm(
        &self,
        portal_key: &str,
        target: &LookupTarget,
        input: &PortalInput,
    ) -> Result<Resolution, MappingError> {
        match input.supplied(portal_key) {
            Supplied::Direct(value) | Supplied::Secondary(value) => {
                let resolved = self.resolve_local_key(portal_key, target, value, input).await?;
                Ok(Resolution::Write(resolved))
            }
            Supplied::ExplicitNull => Ok(Resolution::Write(Value::Null)),
            Supplied::Absent => Ok(Resolution::Omit),
        }
    }

    /// Resolves the populated alternatives of a polymorphic relation
    ///
    /// Returns `(crm_key, value)` pairs in declaration order, one per
    /// alternative with a non-null supplied value.
    pub async fn resolve_polymorphic_to_crm(
        &self,
        alternatives: &[PolymorphicAlternative],
        input: &PortalInput,
    ) -> Result<Vec<(String, Value)>, MappingError> {
        let mut resolved = Vec::new();
        for alternative in alternatives {
            let Some(value) = input.supplied(&alternative.portal_key).value() else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let crm_value = self
                .resolve_local_key(&alternative.portal_key, &alternative.target, value, input)
                .await?;
            resolved.push((alternative.target.crm_key.clone(), crm_value));
        }
        Ok(resolved)
    }

    /// Resolves a CRM relation value to its portal representation
    pub async fn resolve_to_portal(
        &self,
        target: &LookupTarget,
        crm_value: Option<&Value>,
    ) -> Result<Value, MappingError> {
        let Some(external_id) = crm_value.and_then(external_id_from_value) else {
            return Ok(Value::Null);
        };

        let Some(related) = target.related else {
            return Ok(Value::String(external_id.into_inner()));
        };

        match self.store.find_by_external_id(related, &external_id).await? {
            Some(entity) => Ok(local_id_to_value(entity.id)),
            None => {
                debug!(
                    entity_type = %related,
                    external_id = %external_id,
                    "Related entity not synced locally, keeping external id"
                );
                Ok(Value::String(external_id.into_inner()))
            }
        }
    }

    /// Resolves every alternative of a polymorphic relation from a CRM record
    ///
    /// The last alternative with a non-null result wins; null when none is set.
    pub async fn resolve_polymorphic_to_portal(
        &self,
        alternatives: &[PolymorphicAlternative],
        record: &CrmRecord,
    ) -> Result<Value, MappingError> {
        let mut resolved = Value::Null;
        for alternative in alternatives {
            let value = self
                .resolve_to_portal(&alternative.target, record.field(&alternative.target.crm_key))
                .await?;
            if !value.is_null() {
                resolved = value;
            }
        }
        Ok(resolved)
    }

    async fn resolve_local_key(
        &self,
        portal_key: &str,
        target: &LookupTarget,
        value: &Value,
        input: &PortalInput,
    ) -> Result<Value, MappingError> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        let Some(related) = target.related else {
            return Ok(value.clone());
        };

        let Some(local_id) = local_id_from_value(value) else {
            debug!(portal_key, value = %value, "Relation value is not a local id");
            return Ok(Value::Null);
        };

        if let Some(preloaded) = input
            .relations()
            .iter()
            .find(|r| r.entity_type == related && r.id == local_id)
        {
            return Ok(external_id_to_value(preloaded.external_id.clone()));
        }

        match self.store.find_by_id(related, local_id).await? {
            Some(entity) => Ok(external_id_to_value(entity.external_id)),
            None => {
                debug!(
                    portal_key,
                    entity_type = %related,
                    local_id = %local_id,
                    "Related entity not found, clearing relation"
                );
                Ok(Value::Null)
            }
        }
    }
}
