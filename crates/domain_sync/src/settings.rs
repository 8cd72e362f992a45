//! Typed access to the persisted sync settings
//!
//! Five CRM-side identifiers are resolved once and cached in the settings
//! store: the two financial types (configured by an operator) and the three
//! custom-field identifiers (generated by the lazy bootstrap in
//! [`crate::contribution::ensure_custom_fields`]).

use core_kernel::{CoreError, CustomFieldId, CustomGroupId, FinancialTypeId};
use std::str::FromStr;
use std::sync::Arc;

use crate::ports::SettingsStore;

/// Settings keys
pub mod keys {
    /// Standard contribution financial type
    pub const FINANCIAL_TYPE_ID: &str = "financial_type_id";
    /// Tax-inclusive (VAT) contribution financial type
    pub const FINANCIAL_TYPE_VAT_ID: &str = "financial_type_vat_id";
    /// Generated "Sales tax" custom field
    pub const SALES_TAX_FIELD_ID: &str = "sales_tax_field_id";
    /// Generated "Shipping Cost" custom field
    pub const SHIPPING_COST_FIELD_ID: &str = "shipping_cost_field_id";
    /// Generated custom field group; its presence gates the bootstrap
    pub const CONTRIBUTION_GROUP_ID: &str = "contribution_group_id";
}

/// Typed wrapper over the raw settings store
#[derive(Clone)]
pub struct SyncSettings {
    store: Arc<dyn SettingsStore>,
}

impl SyncSettings {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    fn get_id<T: FromStr>(&self, key: &str) -> Result<Option<T>, CoreError> {
        match self.store.get(key)? {
            Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
                CoreError::configuration(format!("setting {key} holds a non-numeric value: {raw}"))
            }),
            None => Ok(None),
        }
    }

    fn require_id<T: FromStr>(&self, key: &str) -> Result<T, CoreError> {
        self.get_id(key)?
            .ok_or_else(|| CoreError::configuration(format!("setting {key} is not configured")))
    }

    /// Standard financial type; must be configured by an operator
    pub fn financial_type(&self) -> Result<FinancialTypeId, CoreError> {
        self.require_id(keys::FINANCIAL_TYPE_ID)
    }

    /// VAT financial type; must be configured by an operator
    pub fn vat_financial_type(&self) -> Result<FinancialTypeId, CoreError> {
        self.require_id(keys::FINANCIAL_TYPE_VAT_ID)
    }

    /// Persisted custom group id, if the bootstrap already ran
    pub fn contribution_group(&self) -> Result<Option<CustomGroupId>, CoreError> {
        self.get_id(keys::CONTRIBUTION_GROUP_ID)
    }

    /// Persisted sales-tax field id, if the bootstrap already ran
    pub fn sales_tax_field(&self) -> Result<Option<CustomFieldId>, CoreError> {
        self.get_id(keys::SALES_TAX_FIELD_ID)
    }

    /// Persisted shipping-cost field id, if the bootstrap already ran
    pub fn shipping_cost_field(&self) -> Result<Option<CustomFieldId>, CoreError> {
        self.get_id(keys::SHIPPING_COST_FIELD_ID)
    }

    /// Persists the generated custom group id
    pub fn record_contribution_group(&self, id: CustomGroupId) -> Result<(), CoreError> {
        self.store
            .put(keys::CONTRIBUTION_GROUP_ID, &id.to_string())
    }

    /// Persists the generated sales-tax field id
    pub fn record_sales_tax_field(&self, id: CustomFieldId) -> Result<(), CoreError> {
        self.store.put(keys::SALES_TAX_FIELD_ID, &id.to_string())
    }

    /// Persists the generated shipping-cost field id
    pub fn record_shipping_cost_field(&self, id: CustomFieldId) -> Result<(), CoreError> {
        self.store
            .put(keys::SHIPPING_COST_FIELD_ID, &id.to_string())
    }

    /// Seeds the operator-configured financial types; used by tests and setup
    pub fn configure_financial_types(
        &self,
        standard: FinancialTypeId,
        vat: FinancialTypeId,
    ) -> Result<(), CoreError> {
        self.store
            .put(keys::FINANCIAL_TYPE_ID, &standard.to_string())?;
        self.store
            .put(keys::FINANCIAL_TYPE_VAT_ID, &vat.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::MemorySettings;

    #[test]
    fn test_missing_financial_type_is_a_configuration_error() {
        let settings = SyncSettings::new(Arc::new(MemorySettings::new()));
        let err = settings.financial_type().unwrap_err();
        assert!(err.to_string().contains("financial_type_id"));
    }

    #[test]
    fn test_recorded_ids_read_back() {
        let settings = SyncSettings::new(Arc::new(MemorySettings::new()));
        settings
            .record_contribution_group(CustomGroupId::new(9))
            .unwrap();
        settings
            .record_sales_tax_field(CustomFieldId::new(10))
            .unwrap();
        assert_eq!(
            settings.contribution_group().unwrap(),
            Some(CustomGroupId::new(9))
        );
        assert_eq!(
            settings.sales_tax_field().unwrap(),
            Some(CustomFieldId::new(10))
        );
        assert_eq!(settings.shipping_cost_field().unwrap(), None);
    }

    #[test]
    fn test_garbage_value_is_rejected() {
        let store = Arc::new(MemorySettings::new());
        store.put(keys::FINANCIAL_TYPE_ID, "not-a-number").unwrap();
        let settings = SyncSettings::new(store);
        assert!(settings.financial_type().is_err());
    }
}
