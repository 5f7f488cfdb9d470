//! Core Kernel - Foundational types for CRM record synchronization
//!
//! This crate provides the building blocks shared by the mapping and sync crates:
//! - Local and external identifiers, plus entity type tags
//! - The port error type and health-check abstractions for collaborators

pub mod identifiers;
pub mod error;
pub mod ports;

pub use identifiers::{LocalId, ExternalId, EntityType};
pub use error::CoreError;
pub use ports::{
    PortError, DomainPort, AdapterHealth, HealthCheckResult, HealthCheckable,
};
