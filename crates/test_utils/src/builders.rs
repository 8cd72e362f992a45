//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible
//! defaults. These builders allow tests to specify only the relevant fields
//! while using defaults for everything else.

use core_kernel::OrderId;
use domain_sync::order::{Order, OrderAddress, OrderLineItem};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fixtures::AddressFixtures;

/// Builder for storefront orders
///
/// Defaults to a paid, tax-free UK order with one line item and a complete
/// billing block.
pub struct OrderBuilder {
    id: OrderId,
    customer_id: Option<u64>,
    status: String,
    payment_method: String,
    total: Decimal,
    total_tax: Decimal,
    shipping_total: Decimal,
    line_items: Vec<OrderLineItem>,
    billing: OrderAddress,
    shipping: OrderAddress,
}

impl Default for OrderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            id: OrderId::new(792),
            customer_id: None,
            status: "processing".to_string(),
            payment_method: "paypal".to_string(),
            total: dec!(45.00),
            total_tax: dec!(0.00),
            shipping_total: dec!(0.00),
            line_items: vec![OrderLineItem {
                name: "Widget".to_string(),
                quantity: 2,
            }],
            billing: AddressFixtures::uk_billing(),
            shipping: AddressFixtures::empty(),
        }
    }

    /// Sets the order id
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = OrderId::new(id);
        self
    }

    /// Sets the storefront customer id behind the order
    pub fn with_customer_id(mut self, id: u64) -> Self {
        self.customer_id = Some(id);
        self
    }

    /// Sets the order status
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Sets the payment gateway code
    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = method.into();
        self
    }

    /// Sets the grand total
    pub fn with_total(mut self, total: Decimal) -> Self {
        self.total = total;
        self
    }

    /// Sets the tax amount
    pub fn with_tax(mut self, tax: Decimal) -> Self {
        self.total_tax = tax;
        self
    }

    /// Sets the shipping cost
    pub fn with_shipping_total(mut self, shipping: Decimal) -> Self {
        self.shipping_total = shipping;
        self
    }

    /// Replaces the line items
    pub fn with_line_items(mut self, items: Vec<OrderLineItem>) -> Self {
        self.line_items = items;
        self
    }

    /// Appends one line item
    pub fn with_line_item(mut self, name: impl Into<String>, quantity: u32) -> Self {
        self.line_items.push(OrderLineItem {
            name: name.into(),
            quantity,
        });
        self
    }

    /// Sets the billing block
    pub fn with_billing(mut self, billing: OrderAddress) -> Self {
        self.billing = billing;
        self
    }

    /// Sets the shipping block
    pub fn with_shipping(mut self, shipping: OrderAddress) -> Self {
        self.shipping = shipping;
        self
    }

    /// Builds the order
    pub fn build(self) -> Order {
        Order {
            id: self.id,
            customer_id: self.customer_id,
            status: self.status,
            payment_method: self.payment_method,
            total: self.total,
            total_tax: self.total_tax,
            shipping_total: self.shipping_total,
            line_items: self.line_items,
            billing: self.billing,
            shipping: self.shipping,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order_is_complete() {
        let order = OrderBuilder::new().build();
        assert_eq!(order.id.as_u64(), 792);
        assert_eq!(order.billing.first_name, "Jane");
        assert!(!order.line_items.is_empty());
    }

    #[test]
    fn test_builder_overrides() {
        let order = OrderBuilder::new()
            .with_id(17)
            .with_status("wc-completed")
            .with_tax(dec!(5.00))
            .with_line_item("Gadget", 1)
            .build();
        assert_eq!(order.id.as_u64(), 17);
        assert_eq!(order.status, "wc-completed");
        assert_eq!(order.line_items.len(), 2);
    }
}
