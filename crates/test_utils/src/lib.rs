//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! CRM record sync test suite.
//!
//! # Modules
//!
//! - `fixtures`: Mapping specs for accounts, contacts and deals, plus shared ids
//! - `builders`: Builder patterns for portal entities, CRM records and sync harnesses
//! - `assertions`: Custom assertion helpers for translated records and sync errors
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
