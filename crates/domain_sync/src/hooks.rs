//! Extension hooks
//!
//! Two filter points let embedding code rewrite the outgoing parameter set
//! immediately before the contribution-create and contribution-lookup CRM
//! calls, mirroring the filter hooks of the system this was ported from.

use crate::records::{ContributionParams, ContributionQuery};

/// Filters applied to contribution traffic before transmission
///
/// The default implementations pass parameters through unchanged.
pub trait SyncHooks: Send + Sync {
    /// Called with the full parameter set before `Contribution.create`
    fn before_contribution_create(&self, params: ContributionParams) -> ContributionParams {
        params
    }

    /// Called with the lookup query before the status-sync `Contribution.getsingle`
    fn before_contribution_lookup(&self, query: ContributionQuery) -> ContributionQuery {
        query
    }
}

/// Pass-through hooks
#[derive(Debug, Default)]
pub struct NoopHooks;

impl SyncHooks for NoopHooks {}
