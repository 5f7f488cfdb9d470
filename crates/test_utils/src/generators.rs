//! Property-Based Test Generators
//!
//! Provides proptest strategies for CRM values and records that keep the
//! shapes the translator expects.

use std::sync::Arc;

use core_kernel::{ExternalId, LocalId};
use domain_mapping::{CrmRecord, MappingSpec};
use proptest::prelude::*;
use serde_json::Value;
use uuid::Uuid;

/// Strategy for non-null scalar CRM values
pub fn non_null_scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        (-1.0e9f64..1.0e9f64).prop_map(Value::from),
        "[A-Za-z0-9 .@-]{1,32}".prop_map(Value::from),
    ]
}

/// Strategy for scalar CRM values, null included
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        1 => Just(Value::Null),
        4 => non_null_scalar_strategy(),
    ]
}

/// Strategy for CRM record identifiers
pub fn external_id_strategy() -> impl Strategy<Value = ExternalId> {
    (1u64..u64::MAX).prop_map(|n| ExternalId::new(n.to_string()).unwrap())
}

pub fn local_id_strategy() -> impl Strategy<Value = LocalId> {
    any::<u128>().prop_map(|n| LocalId::from_uuid(Uuid::from_u128(n)))
}

/// Strategy for records carrying some subset of a spec's plain fields
///
/// Each field is either absent or holds a scalar (possibly null).
pub fn field_record_strategy(spec: Arc<MappingSpec>) -> impl Strategy<Value = CrmRecord> {
    let crm_keys: Vec<String> = spec.fields().iter().map(|f| f.crm_key.clone()).collect();
    let values = proptest::collection::vec(
        proptest::option::of(scalar_strategy()),
        crm_keys.len(),
    );
    (external_id_strategy(), values).prop_map(move |(id, values)| {
        crm_keys
            .iter()
            .zip(values)
            .fold(CrmRecord::new(id), |record, (key, value)| match value {
                Some(value) => record.with_field(key.as_str(), value),
                None => record,
            })
    })
}

/// Strategy for records with every plain field set to a non-null scalar
pub fn complete_field_record_strategy(spec: Arc<MappingSpec>) -> impl Strategy<Value = CrmRecord> {
    let crm_keys: Vec<String> = spec.fields().iter().map(|f| f.crm_key.clone()).collect();
    let values = proptest::collection::vec(non_null_scalar_strategy(), crm_keys.len());
    (external_id_strategy(), values).prop_map(move |(id, values)| {
        crm_keys
            .iter()
            .zip(values)
            .fold(CrmRecord::new(id), |record, (key, value)| {
                record.with_field(key.as_str(), value)
            })
    })
}
