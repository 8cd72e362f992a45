//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for orders, address blocks, and CRM
//! records. These fixtures are designed to be consistent and predictable
//! for unit tests.

use chrono::{DateTime, TimeZone, Utc};
use core_kernel::ContactId;
use domain_sync::order::OrderAddress;
use domain_sync::records::{ContactRecord, DedupeProbe};

/// Fixture for address blocks
pub struct AddressFixtures;

impl AddressFixtures {
    /// A complete UK billing block with phone and email
    pub fn uk_billing() -> OrderAddress {
        OrderAddress {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            company: String::new(),
            address_1: "12 High Street".to_string(),
            address_2: String::new(),
            city: "London".to_string(),
            postcode: "SW1A 1AA".to_string(),
            state: String::new(),
            country: "GB".to_string(),
            email: Some("jane.doe@example.org".to_string()),
            phone: Some("020 7946 0000".to_string()),
        }
    }

    /// A US shipping block; no phone or email, as the storefront carries none
    pub fn us_shipping() -> OrderAddress {
        OrderAddress {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            company: "Acme Ltd".to_string(),
            address_1: "500 Market Street".to_string(),
            address_2: "Suite 400".to_string(),
            city: "San Francisco".to_string(),
            postcode: "94105".to_string(),
            state: "CA".to_string(),
            country: "US".to_string(),
            email: None,
            phone: None,
        }
    }

    /// An empty block, as sent for orders without a shipping address
    pub fn empty() -> OrderAddress {
        OrderAddress::default()
    }
}

/// Fixture for CRM contact records
pub struct ContactFixtures;

impl ContactFixtures {
    /// A contact matching [`AddressFixtures::uk_billing`] under the CRM's
    /// duplicate rule
    pub fn jane_doe(id: ContactId) -> ContactRecord {
        ContactRecord {
            id,
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            display_name: "Jane Doe".to_string(),
            email: Some("jane.doe@example.org".to_string()),
            source: Some("Imported 2019".to_string()),
        }
    }

    /// The dedupe probe the sync flow derives from
    /// [`AddressFixtures::uk_billing`]
    pub fn jane_doe_probe() -> DedupeProbe {
        DedupeProbe {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane.doe@example.org".to_string(),
        }
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// A fixed order placement timestamp
    pub fn order_placed() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap()
    }
}
