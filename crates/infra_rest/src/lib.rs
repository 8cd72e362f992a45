//! REST Infrastructure Adapters
//!
//! Concrete implementations of the `domain_sync` port traits over HTTP:
//!
//! - [`crm::CiviCrmRestAdapter`]: the CRM's v3 REST API
//! - [`storefront::WooRestAdapter`]: the storefront's order-notes endpoint
//! - [`storefront::UfMatchResolver`]: customer-to-contact resolution via the
//!   CRM's user-account mapping table
//! - [`settings::JsonFileSettings`]: a JSON file as the settings store

pub mod crm;
pub mod settings;
pub mod storefront;

pub use crm::CiviCrmRestAdapter;
pub use settings::JsonFileSettings;
pub use storefront::{UfMatchResolver, WooRestAdapter};
