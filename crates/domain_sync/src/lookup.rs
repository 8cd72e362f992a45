//! Lookup helper for CRM reference data
//!
//! Translates raw storefront field values (ISO country codes, state
//! abbreviations, address kinds) into the CRM's numeric identifiers.
//! Reference data churn is effectively nil, so every resolution is cached
//! for the process lifetime; each distinct key costs at most one CRM read.

use core_kernel::{CountryId, LocationTypeId, PortError, StateProvinceId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::order::AddressKind;
use crate::ports::CrmPort;

/// Cached resolver for location types, countries, and states
pub struct LookupHelper {
    crm: Arc<dyn CrmPort>,
    location_types: RwLock<Option<HashMap<String, LocationTypeId>>>,
    countries: RwLock<HashMap<String, CountryId>>,
    states: RwLock<HashMap<(String, CountryId), StateProvinceId>>,
}

impl LookupHelper {
    pub fn new(crm: Arc<dyn CrmPort>) -> Self {
        Self {
            crm,
            location_types: RwLock::new(None),
            countries: RwLock::new(HashMap::new()),
            states: RwLock::new(HashMap::new()),
        }
    }

    /// Resolves the CRM location type for an address kind
    ///
    /// The full location-type list is fetched once and matched by name,
    /// case-insensitively.
    pub async fn location_type_id(&self, kind: AddressKind) -> Result<LocationTypeId, PortError> {
        let wanted = kind.location_type_name().to_lowercase();

        if let Some(types) = self.location_types.read().await.as_ref() {
            return types
                .get(&wanted)
                .copied()
                .ok_or_else(|| PortError::not_found("LocationType", kind.location_type_name()));
        }

        let fetched = self.crm.list_location_types().await?;
        let by_name: HashMap<String, LocationTypeId> = fetched
            .into_iter()
            .map(|t| (t.name.to_lowercase(), t.id))
            .collect();
        let result = by_name
            .get(&wanted)
            .copied()
            .ok_or_else(|| PortError::not_found("LocationType", kind.location_type_name()));
        *self.location_types.write().await = Some(by_name);
        result
    }

    /// Resolves a country by its raw storefront ISO code
    ///
    /// Empty input and countries unknown to the CRM both resolve to `None`;
    /// the address is then filed without a country rather than dropped.
    pub async fn country_id(&self, iso_code: &str) -> Result<Option<CountryId>, PortError> {
        let iso_code = iso_code.trim();
        if iso_code.is_empty() {
            return Ok(None);
        }
        if let Some(id) = self.countries.read().await.get(iso_code) {
            return Ok(Some(*id));
        }
        match self.crm.find_country(iso_code).await {
            Ok(id) => {
                self.countries
                    .write()
                    .await
                    .insert(iso_code.to_string(), id);
                Ok(Some(id))
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(iso_code, "country unknown to CRM");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Resolves a state/province abbreviation within a country
    ///
    /// Requires a resolved country; without one (or with an empty or unknown
    /// abbreviation) the address is filed without a state.
    pub async fn state_province_id(
        &self,
        abbreviation: &str,
        country_id: Option<CountryId>,
    ) -> Result<Option<StateProvinceId>, PortError> {
        let abbreviation = abbreviation.trim();
        let Some(country_id) = country_id else {
            return Ok(None);
        };
        if abbreviation.is_empty() {
            return Ok(None);
        }
        let key = (abbreviation.to_string(), country_id);
        if let Some(id) = self.states.read().await.get(&key) {
            return Ok(Some(*id));
        }
        match self.crm.find_state_province(abbreviation, country_id).await {
            Ok(id) => {
                self.states.write().await.insert(key, id);
                Ok(Some(id))
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(abbreviation, %country_id, "state/province unknown to CRM");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::MockCrmPort;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_location_types_fetched_once() {
        let crm = Arc::new(MockCrmPort::new());
        let lookup = LookupHelper::new(crm.clone());

        let billing = lookup.location_type_id(AddressKind::Billing).await.unwrap();
        let shipping = lookup.location_type_id(AddressKind::Shipping).await.unwrap();
        assert_ne!(billing, shipping);

        lookup.location_type_id(AddressKind::Billing).await.unwrap();
        assert_eq!(crm.location_type_reads.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_country_cached_per_iso_code() {
        let crm = Arc::new(MockCrmPort::new());
        let lookup = LookupHelper::new(crm.clone());

        let first = lookup.country_id("GB").await.unwrap();
        let second = lookup.country_id("GB").await.unwrap();
        assert_eq!(first, second);
        assert!(first.is_some());
        assert_eq!(crm.country_reads.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_unknown_country_resolves_to_none() {
        let crm = Arc::new(MockCrmPort::new());
        let lookup = LookupHelper::new(crm);
        assert_eq!(lookup.country_id("ZZ").await.unwrap(), None);
        assert_eq!(lookup.country_id("").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_state_requires_country() {
        let crm = Arc::new(MockCrmPort::new());
        let lookup = LookupHelper::new(crm);
        assert_eq!(lookup.state_province_id("CA", None).await.unwrap(), None);
    }
}
