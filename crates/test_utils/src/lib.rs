//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! order-sync test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for orders, addresses, and CRM records
//! - `builders`: Builder patterns for test data construction
//! - `generators`: Property-based test data generators

pub mod builders;
pub mod fixtures;
pub mod generators;

pub use builders::*;
pub use fixtures::*;
pub use generators::*;
