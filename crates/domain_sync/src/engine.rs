//! Order Sync Engine
//!
//! # Architecture
//!
//! The engine is the single entry point for both storefront events this
//! service reacts to: order finalization and order status changes. It owns no
//! I/O of its own; every external effect goes through the port traits in
//! [`crate::ports`], so the whole flow is testable against in-memory doubles.
//!
//! Failure handling is deliberately uneven across the stages:
//!
//! * contact resolution, fetch, and write failures abort the sync (no contact
//!   means nothing downstream can be filed),
//! * sub-record reconciliation and contribution filing log and continue (a
//!   synced contact without a contribution is still worth keeping),
//! * the status-change path never raises at all.

use std::sync::Arc;

use chrono::Utc;
use core_kernel::{ContactId, ContributionId, OrderId};
use tracing::{debug, info, warn};

use crate::contribution::{build_contribution, ensure_custom_fields, invoice_id, ContributionConfig};
use crate::error::SyncError;
use crate::hooks::SyncHooks;
use crate::lookup::LookupHelper;
use crate::mapping::map_contribution_status;
use crate::order::{AddressKind, Order};
use crate::ports::{ContactResolver, CrmPort, StorefrontPort};
use crate::records::{
    AddressParams, ContactParams, ContributionQuery, DedupeProbe, EmailParams, PhoneParams,
};
use crate::settings::SyncSettings;

/// Contact source stamped on contacts this service creates
pub const DEFAULT_CONTACT_SOURCE: &str = "Woocommerce purchase";

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// CRM admin base URL, with a trailing slash; used for deep links in
    /// order notes
    pub admin_url: String,
}

/// What happened to the contact during a sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactAction {
    Created,
    Updated,
}

/// Result of a successful order sync
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub contact_id: ContactId,
    pub contact_action: ContactAction,
    /// `None` when contribution filing failed or was already done
    pub contribution_id: Option<ContributionId>,
}

/// Outcome of matching an incoming value against a contact's existing
/// sub-records of one kind
enum Reconciliation<Id> {
    /// An existing record already carries the exact incoming value
    AlreadyExists,
    /// Write is needed: update the given record, or create when `None`
    Write(Option<Id>),
}

/// Matches an incoming value against existing sub-records
///
/// An exact value match anywhere wins and suppresses the write; otherwise a
/// record under the same location type becomes the update target.
fn reconcile<R, Id: Copy>(
    existing: &[R],
    location_type: core_kernel::LocationTypeId,
    location_of: impl Fn(&R) -> Option<core_kernel::LocationTypeId>,
    id_of: impl Fn(&R) -> Id,
    value_matches: impl Fn(&R) -> bool,
) -> Reconciliation<Id> {
    if existing.iter().any(value_matches) {
        return Reconciliation::AlreadyExists;
    }
    let target = existing
        .iter()
        .find(|r| location_of(r) == Some(location_type))
        .map(id_of);
    Reconciliation::Write(target)
}

/// Drives the order-to-CRM synchronization flow
pub struct OrderSyncEngine {
    crm: Arc<dyn CrmPort>,
    storefront: Arc<dyn StorefrontPort>,
    resolver: Arc<dyn ContactResolver>,
    settings: SyncSettings,
    hooks: Arc<dyn SyncHooks>,
    lookup: LookupHelper,
    config: EngineConfig,
}

impl OrderSyncEngine {
    pub fn new(
        crm: Arc<dyn CrmPort>,
        storefront: Arc<dyn StorefrontPort>,
        resolver: Arc<dyn ContactResolver>,
        settings: SyncSettings,
        hooks: Arc<dyn SyncHooks>,
        config: EngineConfig,
    ) -> Self {
        let lookup = LookupHelper::new(crm.clone());
        Self {
            crm,
            storefront,
            resolver,
            settings,
            hooks,
            lookup,
            config,
        }
    }

    /// Syncs a finalized order into the CRM
    ///
    /// Resolves or creates the contact, reconciles its address, phone, and
    /// email sub-records, then files one contribution keyed by the order's
    /// deterministic invoice id.
    #[tracing::instrument(skip_all, fields(order_id = %order.id))]
    pub async fn order_finalized(&self, order: &Order) -> Result<SyncOutcome, SyncError> {
        let (contact_id, contact_action) = self.sync_contact(order).await?;

        if let Err(e) = self.reconcile_contact_records(contact_id, order).await {
            warn!(%contact_id, error = %e, "sub-record reconciliation failed; contact sync kept");
        }

        let contribution_id = match self.add_contribution(contact_id, order).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(%contact_id, error = %e, "contribution filing failed; contact sync kept");
                None
            }
        };

        info!(%contact_id, ?contact_action, "order synced");
        Ok(SyncOutcome {
            contact_id,
            contact_action,
            contribution_id,
        })
    }

    /// Resolves the CRM contact for the order, creating or updating as needed
    ///
    /// A resolved existing contact contributes only its source string; the
    /// create-versus-update decision always comes from the duplicate check,
    /// so a stale customer mapping cannot shadow the CRM's own dedupe rule.
    async fn sync_contact(&self, order: &Order) -> Result<(ContactId, ContactAction), SyncError> {
        let resolved = self
            .resolver
            .resolve(order)
            .await
            .map_err(|source| SyncError::ContactResolution {
                order_id: order.id,
                source,
            })?;

        let existing_source = match resolved {
            Some(contact_id) => {
                let contact = self.crm.get_contact(contact_id).await.map_err(|source| {
                    SyncError::ContactFetch { contact_id, source }
                })?;
                contact.source.filter(|s| !s.is_empty())
            }
            None => None,
        };

        let billing = &order.billing;
        let email = order
            .email(AddressKind::Billing)
            .unwrap_or_default()
            .to_string();
        // Transmitted untrimmed: a last-name-only billing block sends " Doe".
        let display_name = format!("{} {}", billing.first_name, billing.last_name);

        let probe = DedupeProbe {
            first_name: billing.first_name.clone(),
            last_name: billing.last_name.clone(),
            email: email.clone(),
        };
        let duplicates = self
            .crm
            .find_contact_duplicates(&probe)
            .await
            .map_err(|source| SyncError::DuplicateCheck {
                order_id: order.id,
                source,
            })?;

        let (id, contact_type, action) = match duplicates.first() {
            Some(&existing) => (Some(existing), None, ContactAction::Updated),
            None => (
                None,
                Some("Individual".to_string()),
                ContactAction::Created,
            ),
        };

        let params = ContactParams {
            id,
            contact_type,
            first_name: billing.first_name.clone(),
            last_name: billing.last_name.clone(),
            email,
            display_name: display_name.clone(),
            source: existing_source.unwrap_or_else(|| DEFAULT_CONTACT_SOURCE.to_string()),
        };
        let contact_id = self
            .crm
            .save_contact(&params)
            .await
            .map_err(|source| SyncError::ContactWrite {
                order_id: order.id,
                source,
            })?;

        let trimmed = display_name.trim();
        let label = if trimmed.is_empty() {
            contact_id.to_string()
        } else {
            trimmed.to_string()
        };
        let link = self.contact_link(contact_id, &label);
        let note = match action {
            ContactAction::Created => format!("Created new CRM contact - {link}"),
            ContactAction::Updated => format!("CRM contact updated - {link}"),
        };
        self.note_order(order.id, &note).await;

        Ok((contact_id, action))
    }

    /// Reconciles the order's address, phone, and email blocks into the
    /// contact's sub-records
    ///
    /// Existing records are listed once per kind up front; each incoming value
    /// then either matches an existing record exactly (no write), overwrites
    /// the record under the same location type, or creates a new record. New
    /// records are announced on the order's notes.
    async fn reconcile_contact_records(
        &self,
        contact_id: ContactId,
        order: &Order,
    ) -> Result<(), core_kernel::PortError> {
        let addresses = self.crm.list_addresses(contact_id).await?;
        let phones = self.crm.list_phones(contact_id).await?;
        let emails = self.crm.list_emails(contact_id).await?;

        for kind in AddressKind::ALL {
            let location_type = self.lookup.location_type_id(kind).await?;
            let block = order.address(kind);

            // A usable address needs at least a street line and a postcode.
            if !block.address_1.is_empty() && !block.postcode.is_empty() {
                let supplemental = (!block.address_2.is_empty()).then(|| block.address_2.clone());
                // Match on the four textual fields only; country and state
                // changes alone do not trigger a rewrite.
                let matched = reconcile(
                    &addresses,
                    location_type,
                    |a| a.location_type_id,
                    |a| a.id,
                    |a| {
                        a.street_address == block.address_1
                            && a.supplemental_address_1 == supplemental
                            && a.city == block.city
                            && a.postal_code == block.postcode
                    },
                );
                if let Reconciliation::Write(target) = matched {
                    let country_id = self.lookup.country_id(&block.country).await?;
                    let state_province_id = self
                        .lookup
                        .state_province_id(&block.state, country_id)
                        .await?;
                    self.crm
                        .save_address(&AddressParams {
                            id: target,
                            contact_id,
                            location_type_id: location_type,
                            street_address: block.address_1.clone(),
                            supplemental_address_1: supplemental,
                            city: block.city.clone(),
                            postal_code: block.postcode.clone(),
                            name: (!block.company.is_empty()).then(|| block.company.clone()),
                            country_id,
                            state_province_id,
                        })
                        .await?;
                    if target.is_none() {
                        let note = format!(
                            "Created new CRM address of type {kind}: {}",
                            block.address_1
                        );
                        self.note_order(order.id, &note).await;
                    }
                }
            }

            if let Some(phone) = order.phone(kind) {
                let matched = reconcile(
                    &phones,
                    location_type,
                    |p| p.location_type_id,
                    |p| p.id,
                    |p| p.phone == phone,
                );
                if let Reconciliation::Write(target) = matched {
                    self.crm
                        .save_phone(&PhoneParams {
                            id: target,
                            contact_id,
                            location_type_id: location_type,
                            phone_type_id: 1,
                            phone: phone.to_string(),
                        })
                        .await?;
                    if target.is_none() {
                        let note = format!("Created new CRM phone of type {kind}: {phone}");
                        self.note_order(order.id, &note).await;
                    }
                }
            }

            if let Some(email) = order.email(kind) {
                let matched = reconcile(
                    &emails,
                    location_type,
                    |e| e.location_type_id,
                    |e| e.id,
                    |e| e.email == email,
                );
                if let Reconciliation::Write(target) = matched {
                    self.crm
                        .save_email(&EmailParams {
                            id: target,
                            contact_id,
                            location_type_id: location_type,
                            email: email.to_string(),
                        })
                        .await?;
                    if target.is_none() {
                        let note = format!("Created new CRM email of type {kind}: {email}");
                        self.note_order(order.id, &note).await;
                    }
                }
            }
        }

        Ok(())
    }

    /// Files the order's contribution
    async fn add_contribution(
        &self,
        contact_id: ContactId,
        order: &Order,
    ) -> Result<ContributionId, SyncError> {
        let (sales_tax_field, shipping_cost_field) =
            ensure_custom_fields(&self.settings, self.crm.as_ref()).await?;
        let config = ContributionConfig {
            financial_type: self.settings.financial_type()?,
            vat_financial_type: self.settings.vat_financial_type()?,
            sales_tax_field,
            shipping_cost_field,
        };

        let params = build_contribution(contact_id, order, &config, Utc::now());
        let params = self.hooks.before_contribution_create(params);

        self.crm
            .save_contribution(&params)
            .await
            .map_err(|source| SyncError::ContributionWrite {
                order_id: order.id,
                source,
            })
    }

    /// Pushes an order's status change onto its contribution
    ///
    /// Best-effort by design: an order whose contribution was never filed (or
    /// predates this service) simply has nothing to update, and a CRM fault
    /// must not fail the storefront's status transition.
    #[tracing::instrument(skip(self))]
    pub async fn order_status_changed(&self, order_id: OrderId, new_status: &str) {
        let query = self.hooks.before_contribution_lookup(ContributionQuery {
            invoice_id: invoice_id(order_id),
        });
        let contribution = match self.crm.find_contribution(&query).await {
            Ok(record) => record,
            Err(e) if e.is_not_found() => {
                debug!(%order_id, "no contribution on file; status change ignored");
                return;
            }
            Err(e) => {
                warn!(%order_id, error = %e, "contribution lookup failed; status change dropped");
                return;
            }
        };

        let status = map_contribution_status(new_status);
        if contribution.status_id == status {
            debug!(%order_id, %status, "contribution already carries the new status");
            return;
        }
        if let Err(e) = self
            .crm
            .set_contribution_status(contribution.id, status)
            .await
        {
            warn!(%order_id, error = %e, "contribution status update failed");
        }
    }

    /// Deep link to the contact in the CRM admin UI
    fn contact_link(&self, contact_id: ContactId, label: &str) -> String {
        format!(
            "<a href=\"{base}admin.php?page=CiviCRM&q=civicrm/contact/view&reset=1&cid={contact_id}\">{label}</a>",
            base = self.config.admin_url
        )
    }

    /// Appends an order note, logging rather than failing on error
    async fn note_order(&self, order_id: OrderId, note: &str) {
        if let Err(e) = self.storefront.add_order_note(order_id, note).await {
            warn!(%order_id, error = %e, "could not append order note");
        }
    }
}
