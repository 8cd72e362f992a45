//! Sync domain errors

use core_kernel::{ContactId, CoreError, OrderId, PortError};
use thiserror::Error;

/// Errors that abort an order-sync stage
///
/// Only the fatal-to-stage failures surface here; sub-record reconciliation
/// and contribution filing swallow their errors at the engine level after
/// logging them.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("could not resolve a CRM contact for order {order_id}")]
    ContactResolution {
        order_id: OrderId,
        #[source]
        source: PortError,
    },

    #[error("could not fetch CRM contact {contact_id}")]
    ContactFetch {
        contact_id: ContactId,
        #[source]
        source: PortError,
    },

    #[error("duplicate check failed for order {order_id}")]
    DuplicateCheck {
        order_id: OrderId,
        #[source]
        source: PortError,
    },

    #[error("could not create or update CRM contact for order {order_id}")]
    ContactWrite {
        order_id: OrderId,
        #[source]
        source: PortError,
    },

    #[error("custom field bootstrap failed")]
    CustomFieldBootstrap {
        #[source]
        source: PortError,
    },

    #[error("could not file contribution for order {order_id}")]
    ContributionWrite {
        order_id: OrderId,
        #[source]
        source: PortError,
    },

    #[error(transparent)]
    Configuration(#[from] CoreError),
}
