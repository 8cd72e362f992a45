//! Sync domain ports
//!
//! Port traits for everything the Order Sync Engine needs from the outside
//! world: the CRM's RPC surface, the storefront's order-notes endpoint, the
//! customer-to-contact resolver, and the persisted settings store. Adapters
//! live in `infra_rest`; in-memory mocks for tests live in [`mock`].
//!
//! All constructor-style dependencies are injected explicitly — the engine
//! takes these traits as parameters rather than reaching for globals.

use async_trait::async_trait;
use core_kernel::{
    AddressId, ContactId, ContributionId, ContributionStatusId, CoreError, CountryId,
    CustomFieldId, CustomGroupId, DomainPort, EmailId, HealthCheckable, LocationTypeId, OrderId,
    PhoneId, PortError, StateProvinceId,
};

use crate::order::Order;
use crate::records::{
    AddressParams, AddressRecord, ContactParams, ContactRecord, ContributionParams,
    ContributionQuery, ContributionRecord, CustomFieldParams, CustomGroupParams, DedupeProbe,
    EmailParams, EmailRecord, LocationTypeRecord, PhoneParams, PhoneRecord,
};

/// The CRM RPC surface consumed by the sync flow
///
/// Each method wraps one remote entity/action pair. A `save_*` call with a
/// `Some` id on its params updates that record in place; with `None` it
/// creates a new record and returns the generated identifier. Every call may
/// fault; faults carry a message only.
#[async_trait]
pub trait CrmPort: DomainPort + HealthCheckable {
    /// Fetches a single contact by id (`Contact.getsingle`)
    async fn get_contact(&self, id: ContactId) -> Result<ContactRecord, PortError>;

    /// Runs the CRM's Unsupervised individual duplicate rule against the
    /// probe's identity fields, with permission checks disabled
    async fn find_contact_duplicates(
        &self,
        probe: &DedupeProbe,
    ) -> Result<Vec<ContactId>, PortError>;

    /// Creates or updates a contact (`Contact.create`)
    async fn save_contact(&self, params: &ContactParams) -> Result<ContactId, PortError>;

    /// Lists a contact's address sub-records (`Address.get`)
    async fn list_addresses(&self, contact_id: ContactId) -> Result<Vec<AddressRecord>, PortError>;

    /// Creates or updates an address sub-record (`Address.create`)
    async fn save_address(&self, params: &AddressParams) -> Result<AddressId, PortError>;

    /// Lists a contact's phone sub-records (`Phone.get`)
    async fn list_phones(&self, contact_id: ContactId) -> Result<Vec<PhoneRecord>, PortError>;

    /// Creates or updates a phone sub-record (`Phone.create`)
    async fn save_phone(&self, params: &PhoneParams) -> Result<PhoneId, PortError>;

    /// Lists a contact's email sub-records (`Email.get`)
    async fn list_emails(&self, contact_id: ContactId) -> Result<Vec<EmailRecord>, PortError>;

    /// Creates or updates an email sub-record (`Email.create`)
    async fn save_email(&self, params: &EmailParams) -> Result<EmailId, PortError>;

    /// Finds one contribution by query (`Contribution.getsingle`);
    /// `PortError::NotFound` when no record matches
    async fn find_contribution(
        &self,
        query: &ContributionQuery,
    ) -> Result<ContributionRecord, PortError>;

    /// Files a new contribution (`Contribution.create`)
    async fn save_contribution(
        &self,
        params: &ContributionParams,
    ) -> Result<ContributionId, PortError>;

    /// Updates only the status of an existing contribution
    async fn set_contribution_status(
        &self,
        id: ContributionId,
        status: ContributionStatusId,
    ) -> Result<(), PortError>;

    /// Creates a custom field group (`CustomGroup.create`)
    async fn create_custom_group(
        &self,
        params: &CustomGroupParams,
    ) -> Result<CustomGroupId, PortError>;

    /// Creates a custom field (`CustomField.create`)
    async fn create_custom_field(
        &self,
        params: &CustomFieldParams,
    ) -> Result<CustomFieldId, PortError>;

    /// Lists the CRM's configured location types
    async fn list_location_types(&self) -> Result<Vec<LocationTypeRecord>, PortError>;

    /// Resolves a country by ISO code
    async fn find_country(&self, iso_code: &str) -> Result<CountryId, PortError>;

    /// Resolves a state/province by abbreviation within a country
    async fn find_state_province(
        &self,
        abbreviation: &str,
        country_id: CountryId,
    ) -> Result<StateProvinceId, PortError>;
}

/// Write access to the storefront's append-only order audit trail
#[async_trait]
pub trait StorefrontPort: DomainPort {
    /// Appends a human-readable note to the order
    async fn add_order_note(&self, order_id: OrderId, note: &str) -> Result<(), PortError>;
}

/// Maps an order's customer context to a known CRM contact
///
/// `Ok(None)` means no mapping is known (guest checkout or unmapped user) and
/// the flow falls back to dedupe; `Err` aborts the whole sync operation.
#[async_trait]
pub trait ContactResolver: DomainPort {
    async fn resolve(&self, order: &Order) -> Result<Option<ContactId>, PortError>;
}

/// Persisted key/value settings
///
/// Holds the handful of CRM-side identifiers the service resolves once and
/// caches (financial types, custom field ids). Reads and writes are small and
/// infrequent, so the trait is synchronous.
pub trait SettingsStore: DomainPort {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;
    fn put(&self, key: &str, value: &str) -> Result<(), CoreError>;
}

/// In-memory port implementations for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use core_kernel::{AdapterHealth, HealthCheckResult};
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::RwLock;

    /// In-memory CRM double
    ///
    /// Keeps created records so a second engine run observes the first run's
    /// writes, and records every save call so tests can assert on exactly
    /// what was transmitted. Individual operations can be made to fault via
    /// [`MockCrmPort::fail_op`].
    #[derive(Debug, Default)]
    pub struct MockCrmPort {
        next_id: AtomicU32,
        pub contacts: RwLock<HashMap<ContactId, ContactRecord>>,
        pub addresses: RwLock<Vec<(ContactId, AddressRecord)>>,
        pub phones: RwLock<Vec<(ContactId, PhoneRecord)>>,
        pub emails: RwLock<Vec<(ContactId, EmailRecord)>>,
        pub contributions: RwLock<Vec<ContributionRecord>>,
        pub location_types: RwLock<Vec<LocationTypeRecord>>,
        pub countries: RwLock<HashMap<String, CountryId>>,
        pub states: RwLock<HashMap<(String, CountryId), StateProvinceId>>,
        pub contact_saves: RwLock<Vec<ContactParams>>,
        pub address_saves: RwLock<Vec<AddressParams>>,
        pub phone_saves: RwLock<Vec<PhoneParams>>,
        pub email_saves: RwLock<Vec<EmailParams>>,
        pub contribution_saves: RwLock<Vec<ContributionParams>>,
        pub status_updates: RwLock<Vec<(ContributionId, ContributionStatusId)>>,
        pub location_type_reads: AtomicU32,
        pub country_reads: AtomicU32,
        failing_ops: RwLock<HashSet<&'static str>>,
    }

    impl MockCrmPort {
        /// Creates a mock pre-loaded with the default reference data:
        /// Billing/Shipping location types and a small country table
        pub fn new() -> Self {
            let mock = Self {
                next_id: AtomicU32::new(1),
                ..Default::default()
            };
            {
                let mut types = mock.location_types.try_write().expect("fresh lock");
                types.push(LocationTypeRecord {
                    id: LocationTypeId::new(5),
                    name: "Billing".to_string(),
                });
                types.push(LocationTypeRecord {
                    id: LocationTypeId::new(6),
                    name: "Shipping".to_string(),
                });
            }
            {
                let mut countries = mock.countries.try_write().expect("fresh lock");
                countries.insert("GB".to_string(), CountryId::new(1226));
                countries.insert("US".to_string(), CountryId::new(1228));
            }
            mock
        }

        /// Makes the named operation return a remote fault
        pub async fn fail_op(&self, op: &'static str) {
            self.failing_ops.write().await.insert(op);
        }

        async fn maybe_fail(&self, op: &'static str) -> Result<(), PortError> {
            if self.failing_ops.read().await.contains(op) {
                return Err(PortError::remote_fault(format!("{op} failed")));
            }
            Ok(())
        }

        fn allocate(&self) -> u32 {
            self.next_id.fetch_add(1, Ordering::Relaxed)
        }

        /// Seeds an existing contact, returning its id
        pub async fn seed_contact(&self, record: ContactRecord) -> ContactId {
            let id = record.id;
            self.contacts.write().await.insert(id, record);
            id
        }

        /// Seeds an existing address sub-record for a contact
        pub async fn seed_address(&self, contact_id: ContactId, record: AddressRecord) {
            self.addresses.write().await.push((contact_id, record));
        }

        /// Seeds an existing phone sub-record for a contact
        pub async fn seed_phone(&self, contact_id: ContactId, record: PhoneRecord) {
            self.phones.write().await.push((contact_id, record));
        }

        /// Total create calls (saves without an id) across all sub-record types
        pub async fn sub_record_creates(&self) -> usize {
            let addresses = self.address_saves.read().await;
            let phones = self.phone_saves.read().await;
            let emails = self.email_saves.read().await;
            addresses.iter().filter(|p| p.id.is_none()).count()
                + phones.iter().filter(|p| p.id.is_none()).count()
                + emails.iter().filter(|p| p.id.is_none()).count()
        }
    }

    impl DomainPort for MockCrmPort {}

    #[async_trait]
    impl HealthCheckable for MockCrmPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-crm".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: None,
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl CrmPort for MockCrmPort {
        async fn get_contact(&self, id: ContactId) -> Result<ContactRecord, PortError> {
            self.maybe_fail("get_contact").await?;
            self.contacts
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Contact", id))
        }

        async fn find_contact_duplicates(
            &self,
            probe: &DedupeProbe,
        ) -> Result<Vec<ContactId>, PortError> {
            self.maybe_fail("find_contact_duplicates").await?;
            let contacts = self.contacts.read().await;
            let mut ids: Vec<ContactId> = contacts
                .values()
                .filter(|c| {
                    c.first_name == probe.first_name
                        && c.last_name == probe.last_name
                        && c.email.as_deref() == Some(probe.email.as_str())
                })
                .map(|c| c.id)
                .collect();
            ids.sort();
            Ok(ids)
        }

        async fn save_contact(&self, params: &ContactParams) -> Result<ContactId, PortError> {
            self.maybe_fail("save_contact").await?;
            self.contact_saves.write().await.push(params.clone());
            let id = params.id.unwrap_or_else(|| ContactId::new(self.allocate()));
            let record = ContactRecord {
                id,
                first_name: params.first_name.clone(),
                last_name: params.last_name.clone(),
                display_name: params.display_name.clone(),
                email: Some(params.email.clone()),
                source: Some(params.source.clone()),
            };
            self.contacts.write().await.insert(id, record);
            Ok(id)
        }

        async fn list_addresses(
            &self,
            contact_id: ContactId,
        ) -> Result<Vec<AddressRecord>, PortError> {
            self.maybe_fail("list_addresses").await?;
            Ok(self
                .addresses
                .read()
                .await
                .iter()
                .filter(|(cid, _)| *cid == contact_id)
                .map(|(_, r)| r.clone())
                .collect())
        }

        async fn save_address(&self, params: &AddressParams) -> Result<AddressId, PortError> {
            self.maybe_fail("save_address").await?;
            self.address_saves.write().await.push(params.clone());
            let mut addresses = self.addresses.write().await;
            if let Some(id) = params.id {
                if let Some((_, record)) = addresses.iter_mut().find(|(_, r)| r.id == id) {
                    record.location_type_id = Some(params.location_type_id);
                    record.street_address = params.street_address.clone();
                    record.supplemental_address_1 = params.supplemental_address_1.clone();
                    record.city = params.city.clone();
                    record.postal_code = params.postal_code.clone();
                }
                return Ok(id);
            }
            let id = AddressId::new(self.allocate());
            addresses.push((
                params.contact_id,
                AddressRecord {
                    id,
                    location_type_id: Some(params.location_type_id),
                    street_address: params.street_address.clone(),
                    supplemental_address_1: params.supplemental_address_1.clone(),
                    city: params.city.clone(),
                    postal_code: params.postal_code.clone(),
                },
            ));
            Ok(id)
        }

        async fn list_phones(&self, contact_id: ContactId) -> Result<Vec<PhoneRecord>, PortError> {
            self.maybe_fail("list_phones").await?;
            Ok(self
                .phones
                .read()
                .await
                .iter()
                .filter(|(cid, _)| *cid == contact_id)
                .map(|(_, r)| r.clone())
                .collect())
        }

        async fn save_phone(&self, params: &PhoneParams) -> Result<PhoneId, PortError> {
            self.maybe_fail("save_phone").await?;
            self.phone_saves.write().await.push(params.clone());
            let mut phones = self.phones.write().await;
            if let Some(id) = params.id {
                if let Some((_, record)) = phones.iter_mut().find(|(_, r)| r.id == id) {
                    record.location_type_id = Some(params.location_type_id);
                    record.phone = params.phone.clone();
                }
                return Ok(id);
            }
            let id = PhoneId::new(self.allocate());
            phones.push((
                params.contact_id,
                PhoneRecord {
                    id,
                    location_type_id: Some(params.location_type_id),
                    phone: params.phone.clone(),
                },
            ));
            Ok(id)
        }

        async fn list_emails(&self, contact_id: ContactId) -> Result<Vec<EmailRecord>, PortError> {
            self.maybe_fail("list_emails").await?;
            Ok(self
                .emails
                .read()
                .await
                .iter()
                .filter(|(cid, _)| *cid == contact_id)
                .map(|(_, r)| r.clone())
                .collect())
        }

        async fn save_email(&self, params: &EmailParams) -> Result<EmailId, PortError> {
            self.maybe_fail("save_email").await?;
            self.email_saves.write().await.push(params.clone());
            let mut emails = self.emails.write().await;
            if let Some(id) = params.id {
                if let Some((_, record)) = emails.iter_mut().find(|(_, r)| r.id == id) {
                    record.location_type_id = Some(params.location_type_id);
                    record.email = params.email.clone();
                }
                return Ok(id);
            }
            let id = EmailId::new(self.allocate());
            emails.push((
                params.contact_id,
                EmailRecord {
                    id,
                    location_type_id: Some(params.location_type_id),
                    email: params.email.clone(),
                },
            ));
            Ok(id)
        }

        async fn find_contribution(
            &self,
            query: &ContributionQuery,
        ) -> Result<ContributionRecord, PortError> {
            self.maybe_fail("find_contribution").await?;
            self.contributions
                .read()
                .await
                .iter()
                .find(|c| c.invoice_id == query.invoice_id)
                .cloned()
                .ok_or_else(|| {
                    PortError::not_found("Contribution", format!("invoice_id={}", query.invoice_id))
                })
        }

        async fn save_contribution(
            &self,
            params: &ContributionParams,
        ) -> Result<ContributionId, PortError> {
            self.maybe_fail("save_contribution").await?;
            self.contribution_saves.write().await.push(params.clone());
            let id = ContributionId::new(self.allocate());
            self.contributions.write().await.push(ContributionRecord {
                id,
                contact_id: params.contact_id,
                status_id: params.status_id,
                invoice_id: params.invoice_id.clone(),
                total_amount: params.total_amount,
            });
            Ok(id)
        }

        async fn set_contribution_status(
            &self,
            id: ContributionId,
            status: ContributionStatusId,
        ) -> Result<(), PortError> {
            self.maybe_fail("set_contribution_status").await?;
            self.status_updates.write().await.push((id, status));
            let mut contributions = self.contributions.write().await;
            match contributions.iter_mut().find(|c| c.id == id) {
                Some(record) => {
                    record.status_id = status;
                    Ok(())
                }
                None => Err(PortError::not_found("Contribution", id)),
            }
        }

        async fn create_custom_group(
            &self,
            _params: &CustomGroupParams,
        ) -> Result<CustomGroupId, PortError> {
            self.maybe_fail("create_custom_group").await?;
            Ok(CustomGroupId::new(self.allocate()))
        }

        async fn create_custom_field(
            &self,
            _params: &CustomFieldParams,
        ) -> Result<CustomFieldId, PortError> {
            self.maybe_fail("create_custom_field").await?;
            Ok(CustomFieldId::new(self.allocate()))
        }

        async fn list_location_types(&self) -> Result<Vec<LocationTypeRecord>, PortError> {
            self.maybe_fail("list_location_types").await?;
            self.location_type_reads.fetch_add(1, Ordering::Relaxed);
            Ok(self.location_types.read().await.clone())
        }

        async fn find_country(&self, iso_code: &str) -> Result<CountryId, PortError> {
            self.maybe_fail("find_country").await?;
            self.country_reads.fetch_add(1, Ordering::Relaxed);
            self.countries
                .read()
                .await
                .get(iso_code)
                .copied()
                .ok_or_else(|| PortError::not_found("Country", iso_code))
        }

        async fn find_state_province(
            &self,
            abbreviation: &str,
            country_id: CountryId,
        ) -> Result<StateProvinceId, PortError> {
            self.maybe_fail("find_state_province").await?;
            self.states
                .read()
                .await
                .get(&(abbreviation.to_string(), country_id))
                .copied()
                .ok_or_else(|| PortError::not_found("StateProvince", abbreviation))
        }
    }

    /// Storefront double that records appended notes
    #[derive(Debug, Default)]
    pub struct MockStorefront {
        pub notes: RwLock<Vec<(OrderId, String)>>,
        pub fail_notes: std::sync::atomic::AtomicBool,
    }

    impl MockStorefront {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn notes_for(&self, order_id: OrderId) -> Vec<String> {
            self.notes
                .read()
                .await
                .iter()
                .filter(|(id, _)| *id == order_id)
                .map(|(_, note)| note.clone())
                .collect()
        }
    }

    impl DomainPort for MockStorefront {}

    #[async_trait]
    impl StorefrontPort for MockStorefront {
        async fn add_order_note(&self, order_id: OrderId, note: &str) -> Result<(), PortError> {
            if self.fail_notes.load(Ordering::Relaxed) {
                return Err(PortError::connection("storefront unreachable"));
            }
            self.notes
                .write()
                .await
                .push((order_id, note.to_string()));
            Ok(())
        }
    }

    /// Resolver double returning a fixed outcome
    #[derive(Debug)]
    pub struct FixedResolver {
        outcome: Result<Option<ContactId>, String>,
    }

    impl FixedResolver {
        /// Resolver for guest/unmapped customers
        pub fn none() -> Self {
            Self { outcome: Ok(None) }
        }

        /// Resolver that always maps to the given contact
        pub fn some(id: ContactId) -> Self {
            Self {
                outcome: Ok(Some(id)),
            }
        }

        /// Resolver that always fails
        pub fn erroring(message: impl Into<String>) -> Self {
            Self {
                outcome: Err(message.into()),
            }
        }
    }

    impl DomainPort for FixedResolver {}

    #[async_trait]
    impl ContactResolver for FixedResolver {
        async fn resolve(&self, _order: &Order) -> Result<Option<ContactId>, PortError> {
            match &self.outcome {
                Ok(id) => Ok(*id),
                Err(message) => Err(PortError::connection(message.clone())),
            }
        }
    }

    /// In-memory settings store
    #[derive(Debug, Default)]
    pub struct MemorySettings {
        values: std::sync::RwLock<HashMap<String, String>>,
    }

    impl MemorySettings {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for MemorySettings {}

    impl SettingsStore for MemorySettings {
        fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
            let values = self
                .values
                .read()
                .map_err(|_| CoreError::configuration("settings lock poisoned"))?;
            Ok(values.get(key).cloned())
        }

        fn put(&self, key: &str, value: &str) -> Result<(), CoreError> {
            let mut values = self
                .values
                .write()
                .map_err(|_| CoreError::configuration("settings lock poisoned"))?;
            values.insert(key.to_string(), value.to_string());
            Ok(())
        }
    }
}
