//! Webhook payload DTOs
//!
//! Shapes of the storefront's order webhook deliveries. Monetary amounts
//! arrive as decimal strings and guest checkouts as `customer_id: 0`; the
//! conversion to the domain [`Order`] normalizes both.

use core_kernel::OrderId;
use domain_sync::{Order, OrderAddress, OrderLineItem};
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::error::ApiError;

/// One order delivery from the storefront
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderPayload {
    pub id: u64,
    #[serde(default)]
    pub customer_id: u64,
    #[validate(length(min = 1, message = "status must not be empty"))]
    pub status: String,
    #[serde(default)]
    pub payment_method: String,
    pub total: String,
    #[serde(default)]
    pub total_tax: String,
    #[serde(default)]
    pub shipping_total: String,
    #[serde(default)]
    pub line_items: Vec<LineItemPayload>,
    #[serde(default)]
    pub billing: AddressPayload,
    #[serde(default)]
    pub shipping: AddressPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineItemPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressPayload {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub address_1: String,
    #[serde(default)]
    pub address_2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Parses a storefront amount string; absent amounts count as zero
fn parse_amount(field: &str, raw: &str) -> Result<Decimal, ApiError> {
    if raw.is_empty() {
        return Ok(Decimal::ZERO);
    }
    raw.parse()
        .map_err(|_| ApiError::Validation(format!("{field} is not a decimal amount: {raw}")))
}

impl From<AddressPayload> for OrderAddress {
    fn from(payload: AddressPayload) -> Self {
        OrderAddress {
            first_name: payload.first_name,
            last_name: payload.last_name,
            company: payload.company,
            address_1: payload.address_1,
            address_2: payload.address_2,
            city: payload.city,
            postcode: payload.postcode,
            state: payload.state,
            country: payload.country,
            email: payload.email,
            phone: payload.phone,
        }
    }
}

impl TryFrom<OrderPayload> for Order {
    type Error = ApiError;

    fn try_from(payload: OrderPayload) -> Result<Self, Self::Error> {
        payload
            .validate()
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        Ok(Order {
            id: OrderId::new(payload.id),
            customer_id: (payload.customer_id != 0).then_some(payload.customer_id),
            status: payload.status,
            payment_method: payload.payment_method,
            total: parse_amount("total", &payload.total)?,
            total_tax: parse_amount("total_tax", &payload.total_tax)?,
            shipping_total: parse_amount("shipping_total", &payload.shipping_total)?,
            line_items: payload
                .line_items
                .into_iter()
                .map(|item| OrderLineItem {
                    name: item.name,
                    quantity: item.quantity,
                })
                .collect(),
            billing: payload.billing.into(),
            shipping: payload.shipping.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_payload() -> OrderPayload {
        serde_json::from_str(
            r#"{
                "id": 792,
                "customer_id": 0,
                "status": "processing",
                "payment_method": "bacs",
                "total": "45.00",
                "total_tax": "5.00",
                "shipping_total": "3.50",
                "line_items": [
                    { "name": "Widget", "quantity": 2 },
                    { "name": "Gadget", "quantity": 1 }
                ],
                "billing": {
                    "first_name": "Jane",
                    "last_name": "Doe",
                    "address_1": "12 High Street",
                    "city": "London",
                    "postcode": "SW1A 1AA",
                    "country": "GB",
                    "email": "jane.doe@example.org",
                    "phone": "020 7946 0000"
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_payload_converts_to_domain_order() {
        let order = Order::try_from(sample_payload()).unwrap();
        assert_eq!(order.id.as_u64(), 792);
        assert_eq!(order.customer_id, None);
        assert_eq!(order.total, dec!(45.00));
        assert_eq!(order.total_tax, dec!(5.00));
        assert_eq!(order.line_items.len(), 2);
        assert_eq!(order.billing.first_name, "Jane");
        assert_eq!(order.shipping, OrderAddress::default());
    }

    #[test]
    fn test_nonzero_customer_id_is_kept() {
        let mut payload = sample_payload();
        payload.customer_id = 17;
        let order = Order::try_from(payload).unwrap();
        assert_eq!(order.customer_id, Some(17));
    }

    #[test]
    fn test_bad_amount_is_rejected() {
        let mut payload = sample_payload();
        payload.total = "forty-five".to_string();
        assert!(Order::try_from(payload).is_err());
    }

    #[test]
    fn test_empty_status_is_rejected() {
        let mut payload = sample_payload();
        payload.status = String::new();
        assert!(Order::try_from(payload).is_err());
    }

    #[test]
    fn test_missing_amounts_default_to_zero() {
        let payload: OrderPayload = serde_json::from_str(
            r#"{ "id": 1, "status": "pending", "total": "10.00" }"#,
        )
        .unwrap();
        let order = Order::try_from(payload).unwrap();
        assert_eq!(order.total_tax, Decimal::ZERO);
        assert_eq!(order.shipping_total, Decimal::ZERO);
    }
}
