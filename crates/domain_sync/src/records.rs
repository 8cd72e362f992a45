//! CRM entity records and write parameters
//!
//! Records are what the sync flow reads back from the CRM; params are what it
//! writes. A `Some` identifier on a params struct turns the write into an
//! update against that record, mirroring the CRM's create-or-update call.

use chrono::{DateTime, Utc};
use core_kernel::{
    AddressId, ContactId, ContributionId, ContributionStatusId, CountryId, CustomFieldId,
    CustomGroupId, EmailId, FinancialTypeId, LocationTypeId, PaymentInstrumentId, PhoneId,
    StateProvinceId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Contact fields read back from the CRM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRecord {
    pub id: ContactId,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub email: Option<String>,
    pub source: Option<String>,
}

/// Identity fields fed to the CRM's duplicate finder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupeProbe {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Contact create-or-update parameters
///
/// The contact subtype is deliberately not representable here: this flow
/// never transmits one, so an update cannot clobber a subtype the CRM holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactParams {
    /// Present for updates, absent for creates
    pub id: Option<ContactId>,
    /// Set to "Individual" on create only
    pub contact_type: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub display_name: String,
    pub source: String,
}

/// Address sub-record read back from the CRM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressRecord {
    pub id: AddressId,
    pub location_type_id: Option<LocationTypeId>,
    pub street_address: String,
    pub supplemental_address_1: Option<String>,
    pub city: String,
    pub postal_code: String,
}

/// Address create-or-update parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressParams {
    pub id: Option<AddressId>,
    pub contact_id: ContactId,
    pub location_type_id: LocationTypeId,
    pub street_address: String,
    pub supplemental_address_1: Option<String>,
    pub city: String,
    pub postal_code: String,
    /// Company name, stored on the CRM address's name field
    pub name: Option<String>,
    pub country_id: Option<CountryId>,
    pub state_province_id: Option<StateProvinceId>,
}

/// Phone sub-record read back from the CRM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneRecord {
    pub id: PhoneId,
    pub location_type_id: Option<LocationTypeId>,
    pub phone: String,
}

/// Phone create-or-update parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneParams {
    pub id: Option<PhoneId>,
    pub contact_id: ContactId,
    pub location_type_id: LocationTypeId,
    /// CRM phone-type option value; 1 is the plain "Phone" type
    pub phone_type_id: u32,
    pub phone: String,
}

/// Email sub-record read back from the CRM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRecord {
    pub id: EmailId,
    pub location_type_id: Option<LocationTypeId>,
    pub email: String,
}

/// Email create-or-update parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailParams {
    pub id: Option<EmailId>,
    pub contact_id: ContactId,
    pub location_type_id: LocationTypeId,
    pub email: String,
}

/// Lookup query for a previously filed contribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionQuery {
    /// Deterministic external reference (`<order-id>_woocommerce`)
    pub invoice_id: String,
}

/// Contribution fields read back from the CRM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionRecord {
    pub id: ContributionId,
    pub contact_id: ContactId,
    pub status_id: ContributionStatusId,
    pub invoice_id: String,
    pub total_amount: Decimal,
}

/// A value for one CRM custom field, transmitted as `custom_<id>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomValue {
    pub field: CustomFieldId,
    pub value: String,
}

/// Contribution creation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionParams {
    pub contact_id: ContactId,
    pub financial_type_id: FinancialTypeId,
    pub payment_instrument_id: PaymentInstrumentId,
    pub total_amount: Decimal,
    pub non_deductible_amount: Decimal,
    pub fee_amount: Decimal,
    pub trxn_id: String,
    pub invoice_id: String,
    /// Itemized order contents; duplicated into `note`
    pub source: String,
    pub note: String,
    pub receive_date: DateTime<Utc>,
    pub status_id: ContributionStatusId,
    pub custom_values: Vec<CustomValue>,
}

/// Custom field-group creation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomGroupParams {
    pub title: String,
    pub name: String,
    /// Entity the group extends (always "Contribution" in this flow)
    pub extends: String,
    pub weight: u32,
    pub collapse_display: bool,
    pub is_active: bool,
}

/// Custom field creation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomFieldParams {
    pub custom_group_id: CustomGroupId,
    pub label: String,
    pub html_type: String,
    pub data_type: String,
    pub weight: u32,
    pub is_required: bool,
    pub is_searchable: bool,
    pub is_active: bool,
}

/// One CRM location type, as listed by the reference-data read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationTypeRecord {
    pub id: LocationTypeId,
    pub name: String,
}
