//! Order-to-CRM synchronization domain
//!
//! # Architecture
//!
//! This crate holds the whole synchronization flow between a storefront's
//! orders and a CRM's contacts and contributions, free of any transport
//! concern. The [`engine::OrderSyncEngine`] orchestrates; everything it
//! touches in the outside world is a port trait from [`ports`], implemented
//! over REST in `infra_rest` and in memory for tests.
//!
//! The flow per finalized order:
//!
//! 1. resolve the customer to a CRM contact (or fall back to the CRM's
//!    duplicate rule) and create or update that contact,
//! 2. reconcile the order's billing and shipping blocks into the contact's
//!    address, phone, and email sub-records,
//! 3. file one contribution for the order, keyed by a deterministic invoice
//!    id so later status changes can find it.

pub mod contribution;
pub mod engine;
pub mod error;
pub mod hooks;
pub mod lookup;
pub mod mapping;
pub mod order;
pub mod ports;
pub mod records;
pub mod settings;

pub use engine::{ContactAction, EngineConfig, OrderSyncEngine, SyncOutcome, DEFAULT_CONTACT_SOURCE};
pub use error::SyncError;
pub use hooks::{NoopHooks, SyncHooks};
pub use order::{AddressKind, Order, OrderAddress, OrderLineItem};
pub use settings::SyncSettings;
