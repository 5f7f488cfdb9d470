//! Sync errors
//!
//! Every CRM failure carries the module and the operation that produced it.

use serde_json::Value;
use thiserror::Error;

use domain_mapping::MappingError;

/// Errors returned by [`RecordSyncService`](crate::RecordSyncService) operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// Translation failed before anything was sent
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// An update was requested for a record that was never synced
    #[error("Cannot update {module} record without a CRM identifier")]
    MissingExternalIdentifier {
        module: String,
    },

    /// The CRM could not be reached or refused the request as a whole
    #[error("{operation} request error for {module}: {message}")]
    CrmRequest {
        module: String,
        operation: String,
        message: String,
    },

    /// The CRM processed the request but rejected the record
    #[error("{message} on record {operation} for module {module} (details: {details})")]
    CrmRecordRejected {
        module: String,
        operation: String,
        message: String,
        details: Value,
    },

    /// The CRM answered without a usable entity response
    #[error("Empty {operation} response for {module}")]
    EmptyResponse {
        module: String,
        operation: String,
    },
}

impl SyncError {
    pub fn request(
        module: impl Into<String>,
        operation: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        SyncError::CrmRequest {
            module: module.into(),
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    pub fn rejected(
        module: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        SyncError::CrmRecordRejected {
            module: module.into(),
            operation: operation.into(),
            message: message.into(),
            details,
        }
    }

    pub fn empty_response(module: impl Into<String>, operation: impl Into<String>) -> Self {
        SyncError::EmptyResponse {
            module: module.into(),
            operation: operation.into(),
        }
    }

    /// The CRM module the failed operation targeted, when known
    pub fn module(&self) -> Option<&str> {
        match self {
            SyncError::Mapping(_) => None,
            SyncError::MissingExternalIdentifier { module }
            | SyncError::CrmRequest { module, .. }
            | SyncError::CrmRecordRejected { module, .. }
            | SyncError::EmptyResponse { module, .. } => Some(module),
        }
    }
}
