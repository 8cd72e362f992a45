//! Core Kernel - Foundational types for the storefront-CRM sync service
//!
//! This crate provides the fundamental building blocks used across all crates:
//! - Strongly-typed identifiers for CRM and storefront entities
//! - Common error types
//! - Ports-and-adapters infrastructure (port errors, health checks, auth config)

pub mod error;
pub mod identifiers;
pub mod ports;

pub use error::CoreError;
pub use identifiers::{
    AddressId, ContactId, ContributionId, ContributionStatusId, CountryId, CustomFieldId,
    CustomGroupId, EmailId, FinancialTypeId, LocationTypeId, OrderId, PaymentInstrumentId,
    PhoneId, StateProvinceId,
};
pub use ports::{
    AdapterHealth, DomainPort, ExternalAuthConfig, ExternalSystemConfig, HealthCheckResult,
    HealthCheckable, PortError,
};
