//! Mapping errors
//!
//! Translation either succeeds completely or fails with one of these. A related
//! entity that cannot be found is not in this list: lookups
//! degrade to null or to the raw external identifier instead.

use serde_json::Value;
use thiserror::Error;

use core_kernel::PortError;

/// Errors raised while building mapping specs or translating records
#[derive(Debug, Error)]
pub enum MappingError {
    /// A codec was asked to translate a value outside its known set
    #[error("Unknown value {value} for enum {codec}")]
    UnknownEnumValue {
        codec: String,
        value: Value,
    },

    /// A mapping spec violated its construction invariants
    #[error("Invalid mapping spec for {entity_type}: {message}")]
    InvalidSpec {
        entity_type: String,
        message: String,
    },

    /// Portal input could not be interpreted
    #[error("Invalid portal input: {0}")]
    InvalidInput(String),

    /// The local entity store failed (absence is not a failure)
    #[error("Entity store error: {0}")]
    Store(#[from] PortError),
}

impl MappingError {
    pub fn unknown_enum_value(codec: impl Into<String>, value: &Value) -> Self {
        MappingError::UnknownEnumValue {
            codec: codec.into(),
            value: value.clone(),
        }
    }

    pub fn invalid_spec(entity_type: impl Into<String>, message: impl Into<String>) -> Self {
        MappingError::InvalidSpec {
            entity_type: entity_type.into(),
            message: message.into(),
        }
    }
}
