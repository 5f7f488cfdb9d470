//! Custom Test Assertions
//!
//! Assertion helpers with messages that name the offending key or module.

use domain_mapping::{CrmFieldMap, MappingSpec, ParsedRecord};
use domain_sync::SyncError;

/// Asserts that a parsed record carries every key the spec declares, and nothing else
///
/// # Panics
///
/// Panics naming the first missing or unexpected key
pub fn assert_all_keys_present(spec: &MappingSpec, parsed: &ParsedRecord) {
    for key in spec.output_keys() {
        assert!(
            parsed.contains_key(key),
            "Key {} missing from {} record: {:?}",
            key,
            spec.module(),
            parsed
        );
    }
    let declared: Vec<&str> = spec.output_keys().collect();
    for key in parsed.keys() {
        assert!(
            declared.contains(&key.as_str()),
            "Unexpected key {} in {} record",
            key,
            spec.module()
        );
    }
}

/// Asserts that a CRM field was left out of the payload entirely
pub fn assert_field_omitted(fields: &CrmFieldMap, crm_key: &str) {
    assert!(
        !fields.contains_key(crm_key),
        "Expected {} to be omitted, got {:?}",
        crm_key,
        fields.get(crm_key)
    );
}

/// Asserts that a sync error is a record rejection for `module` with `message`
pub fn assert_rejected(error: &SyncError, module: &str, message: &str) {
    match error {
        SyncError::CrmRecordRejected {
            module: actual_module,
            message: actual_message,
            ..
        } => {
            assert_eq!(actual_module, module, "Rejection reported for wrong module");
            assert_eq!(actual_message, message, "Rejection carried wrong message");
        }
        other => panic!("Expected CrmRecordRejected for {}, got {:?}", module, other),
    }
}
