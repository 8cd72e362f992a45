//! Property-based Test Data Generators
//!
//! Proptest strategies and randomized fixtures for the order-sync domain.

use domain_sync::order::{OrderAddress, OrderLineItem};
use fake::faker::address::en::{CityName, StreetName, ZipCode};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use proptest::prelude::*;

/// Strategy over storefront order statuses, both bare and `wc-` prefixed
pub fn order_status() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("completed"),
        Just("pending"),
        Just("cancelled"),
        Just("failed"),
        Just("processing"),
        Just("on-hold"),
        Just("refunded"),
    ]
    .prop_flat_map(|status| {
        prop_oneof![
            Just(status.to_string()),
            Just(format!("wc-{status}")),
        ]
    })
}

/// Strategy over payment gateway codes, including unknown gateways
pub fn payment_method() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("paypal".to_string()),
        Just("cod".to_string()),
        Just("cheque".to_string()),
        Just("bacs".to_string()),
        "[a-z]{3,12}",
    ]
}

/// Strategy over non-empty line item lists
pub fn line_items() -> impl Strategy<Value = Vec<OrderLineItem>> {
    prop::collection::vec(
        ("[A-Za-z ]{1,20}", 1u32..20).prop_map(|(name, quantity)| OrderLineItem {
            name: name.trim().to_string(),
            quantity,
        }),
        1..6,
    )
}

/// A randomized but structurally valid billing block
pub fn random_billing_address() -> OrderAddress {
    OrderAddress {
        first_name: FirstName().fake(),
        last_name: LastName().fake(),
        company: String::new(),
        address_1: StreetName().fake(),
        address_2: String::new(),
        city: CityName().fake(),
        postcode: ZipCode().fake(),
        state: String::new(),
        country: "GB".to_string(),
        email: Some(SafeEmail().fake()),
        phone: Some("020 7946 0000".to_string()),
    }
}
