//! Storefront order model
//!
//! The order is owned by the storefront and immutable from this service's
//! perspective, except for its append-only notes list (written through
//! [`crate::ports::StorefrontPort`]). Only the fields the sync flow consumes
//! are modelled.

use core_kernel::OrderId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One purchased line item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    /// Product name as shown on the order
    pub name: String,
    /// Quantity purchased
    pub quantity: u32,
}

/// One address block on an order
///
/// The storefront represents absent fields as empty strings; that convention
/// is kept here so reconciliation compares what the storefront actually sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAddress {
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    pub postcode: String,
    /// State/province abbreviation as raw storefront text
    pub state: String,
    /// ISO country code as raw storefront text
    pub country: String,
    /// Present on the billing block only
    pub email: Option<String>,
    /// Present on the billing block only
    pub phone: Option<String>,
}

/// The two address kinds an order carries
///
/// Each kind maps to a CRM location type during reconciliation. The explicit
/// accessor methods on [`Order`] replace the reflective per-kind field reads
/// of the system this was ported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    Billing,
    Shipping,
}

impl AddressKind {
    /// All kinds, in the order the sync flow processes them
    pub const ALL: [AddressKind; 2] = [AddressKind::Billing, AddressKind::Shipping];

    /// Returns the kind's lowercase name, matching the storefront field prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressKind::Billing => "billing",
            AddressKind::Shipping => "shipping",
        }
    }

    /// Returns the CRM location-type name this kind maps to
    pub fn location_type_name(&self) -> &'static str {
        match self {
            AddressKind::Billing => "Billing",
            AddressKind::Shipping => "Shipping",
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A storefront order, as delivered by the order-finalized event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Storefront order identifier
    pub id: OrderId,
    /// Storefront user id behind the order; `None` for guest checkouts
    pub customer_id: Option<u64>,
    /// Current order status, possibly `wc-` prefixed
    pub status: String,
    /// Payment gateway code (e.g. "paypal", "bacs")
    pub payment_method: String,
    /// Grand total including tax and shipping
    pub total: Decimal,
    /// Total tax
    pub total_tax: Decimal,
    /// Total shipping cost
    pub shipping_total: Decimal,
    /// Purchased items, in storefront order
    pub line_items: Vec<OrderLineItem>,
    pub billing: OrderAddress,
    pub shipping: OrderAddress,
}

impl Order {
    /// Returns the address block for the given kind
    pub fn address(&self, kind: AddressKind) -> &OrderAddress {
        match kind {
            AddressKind::Billing => &self.billing,
            AddressKind::Shipping => &self.shipping,
        }
    }

    /// Returns the phone for the given kind, if the storefront carries one
    ///
    /// The storefront has no shipping-phone field, so the shipping kind
    /// always resolves to `None`.
    pub fn phone(&self, kind: AddressKind) -> Option<&str> {
        match kind {
            AddressKind::Billing => self.billing.phone.as_deref().filter(|p| !p.is_empty()),
            AddressKind::Shipping => None,
        }
    }

    /// Returns the email for the given kind, if the storefront carries one
    ///
    /// The storefront has no shipping-email field, so the shipping kind
    /// always resolves to `None`.
    pub fn email(&self, kind: AddressKind) -> Option<&str> {
        match kind {
            AddressKind::Billing => self.billing.email.as_deref().filter(|e| !e.is_empty()),
            AddressKind::Shipping => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn minimal_order() -> Order {
        Order {
            id: OrderId::new(1),
            customer_id: None,
            status: "processing".to_string(),
            payment_method: "bacs".to_string(),
            total: dec!(10.00),
            total_tax: dec!(0.00),
            shipping_total: dec!(0.00),
            line_items: vec![],
            billing: OrderAddress {
                email: Some("jane@example.org".to_string()),
                phone: Some("020 7946 0000".to_string()),
                ..Default::default()
            },
            shipping: OrderAddress::default(),
        }
    }

    #[test]
    fn test_shipping_kind_never_exposes_phone_or_email() {
        let order = minimal_order();
        assert_eq!(order.phone(AddressKind::Billing), Some("020 7946 0000"));
        assert_eq!(order.phone(AddressKind::Shipping), None);
        assert_eq!(order.email(AddressKind::Billing), Some("jane@example.org"));
        assert_eq!(order.email(AddressKind::Shipping), None);
    }

    #[test]
    fn test_empty_billing_phone_counts_as_absent() {
        let mut order = minimal_order();
        order.billing.phone = Some(String::new());
        assert_eq!(order.phone(AddressKind::Billing), None);
    }

    #[test]
    fn test_address_kind_names() {
        assert_eq!(AddressKind::Billing.to_string(), "billing");
        assert_eq!(AddressKind::Shipping.location_type_name(), "Shipping");
    }
}
