//! Tests for core_kernel error types

use core_kernel::error::CoreError;
use core_kernel::ports::PortError;
use core_kernel::ExternalId;

#[test]
fn test_core_error_invalid_identifier() {
    let error = CoreError::invalid_identifier("external id must not be blank");

    match error {
        CoreError::InvalidIdentifier(msg) => assert!(msg.contains("blank")),
    }
}

#[test]
fn test_blank_external_id_error_display() {
    let error = ExternalId::new("").unwrap_err();
    let display = format!("{}", error);

    assert!(display.contains("Invalid identifier"));
}

#[test]
fn test_port_error_connection_has_no_source_by_default() {
    use std::error::Error;

    let error = PortError::connection("socket closed");
    assert!(error.is_transient());
    assert!(error.source().is_none());
    assert_eq!(error.to_string(), "Connection error: socket closed");
}

#[test]
fn test_port_error_internal_with_source() {
    use std::error::Error;

    let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
    let error = PortError::Internal {
        message: "token store write failed".to_string(),
        source: Some(Box::new(io)),
    };

    assert!(!error.is_transient());
    assert!(error.source().is_some());
}
