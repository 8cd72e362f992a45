//! CRM REST Adapter
//!
//! Implements [`CrmPort`] over the CRM's v3 REST endpoint. Every operation is
//! one POST to the same URL carrying an `entity`/`action` pair, the dual
//! authentication keys, and a `json` form field with the call parameters.
//!
//! # Architecture
//!
//! The CRM's envelope is weakly typed: numeric fields frequently arrive as
//! JSON strings, record sets arrive as objects keyed by record id, and faults
//! are signalled in-band via an `is_error` flag next to HTTP 200. The parsing
//! helpers at the bottom of this module absorb all of that so the port
//! methods read as straight-line request/extract code.
//!
//! # Error Handling
//!
//! Failures are mapped to `PortError` variants:
//! - transport timeout -> `PortError::Timeout`
//! - other transport failures -> `PortError::Connection`
//! - HTTP 401/403 -> `PortError::Unauthorized`
//! - HTTP 429 -> `PortError::RateLimited`
//! - HTTP 5xx -> `PortError::ServiceUnavailable`
//! - `is_error` envelope -> `PortError::RemoteFault`, except the
//!   "Expected one ..." fault of `getsingle`, which becomes `NotFound`

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use tracing::debug;

use core_kernel::{
    AdapterHealth, AddressId, ContactId, ContributionId, ContributionStatusId, CountryId,
    CustomFieldId, CustomGroupId, DomainPort, EmailId, ExternalAuthConfig, ExternalSystemConfig,
    HealthCheckResult, HealthCheckable, LocationTypeId, PhoneId, PortError, StateProvinceId,
};
use domain_sync::ports::CrmPort;
use domain_sync::records::{
    AddressParams, AddressRecord, ContactParams, ContactRecord, ContributionParams,
    ContributionQuery, ContributionRecord, CustomFieldParams, CustomGroupParams, DedupeProbe,
    EmailParams, EmailRecord, LocationTypeRecord, PhoneParams, PhoneRecord,
};

/// REST adapter for the CRM's v3 API
pub struct CiviCrmRestAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    site_key: String,
}

impl CiviCrmRestAdapter {
    /// Creates an adapter from connection settings
    ///
    /// The base URL must point at the CRM's REST endpoint. The auth config
    /// must carry the CRM's per-user API key plus the site key.
    pub fn new(config: ExternalSystemConfig) -> Result<Self, PortError> {
        let ExternalAuthConfig::ApiKeyPair { api_key, site_key } = config.auth else {
            return Err(PortError::validation(
                "CRM adapter requires api_key_pair authentication",
            ));
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PortError::Internal {
                message: "could not build HTTP client".to_string(),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url,
            api_key,
            site_key,
        })
    }

    /// Executes one `entity.action` call and returns the response envelope
    async fn call(&self, entity: &str, action: &str, params: Value) -> Result<Value, PortError> {
        let operation = format!("{entity}.{action}");
        debug!(%operation, "CRM call");

        let json_params = params.to_string();
        let form = [
            ("entity", entity),
            ("action", action),
            ("api_key", self.api_key.as_str()),
            ("key", self.site_key.as_str()),
            ("json", json_params.as_str()),
        ];
        let response = self
            .client
            .post(&self.base_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| transport_error(&operation, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(&operation, status));
        }
        let envelope: Value = response
            .json()
            .await
            .map_err(|e| transport_error(&operation, e))?;

        if opt_u32(&envelope["is_error"]).unwrap_or(0) != 0 {
            let message = envelope["error_message"]
                .as_str()
                .unwrap_or("unspecified CRM fault")
                .to_string();
            return Err(PortError::RemoteFault { message });
        }
        Ok(envelope)
    }

    /// `getsingle` wrapper that turns the CRM's zero-match fault into NotFound
    async fn get_single(&self, entity: &str, params: Value) -> Result<Value, PortError> {
        let query = params.to_string();
        match self.call(entity, "getsingle", params).await {
            Err(PortError::RemoteFault { message }) if message.starts_with("Expected one") => {
                Err(PortError::not_found(entity, query))
            }
            other => other,
        }
    }

    /// Resolves a storefront user id to a CRM contact via the CRM's
    /// user-account mapping table
    pub async fn uf_match_contact(&self, uf_id: u64) -> Result<ContactId, PortError> {
        let record = self.get_single("UFMatch", json!({ "uf_id": uf_id })).await?;
        req_u32(&record, "contact_id").map(ContactId::new)
    }
}

impl DomainPort for CiviCrmRestAdapter {}

#[async_trait]
impl HealthCheckable for CiviCrmRestAdapter {
    /// Verifies connectivity and credentials with a minimal read call
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let result = self
            .call("Contact", "getcount", json!({ "options": { "limit": 1 } }))
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: "civicrm-rest-adapter".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: "civicrm-rest-adapter".to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(e.to_string()),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl CrmPort for CiviCrmRestAdapter {
    async fn get_contact(&self, id: ContactId) -> Result<ContactRecord, PortError> {
        let record = self
            .get_single("Contact", json!({ "id": id.as_u32() }))
            .await?;
        contact_from(&record)
    }

    async fn find_contact_duplicates(
        &self,
        probe: &DedupeProbe,
    ) -> Result<Vec<ContactId>, PortError> {
        let envelope = self
            .call(
                "Contact",
                "duplicatecheck",
                json!({
                    "match": {
                        "contact_type": "Individual",
                        "first_name": probe.first_name,
                        "last_name": probe.last_name,
                        "email": probe.email,
                    },
                    "check_permissions": 0,
                }),
            )
            .await?;
        values_list(&envelope)
            .iter()
            .map(|v| req_u32(v, "id").map(ContactId::new))
            .collect()
    }

    async fn save_contact(&self, params: &ContactParams) -> Result<ContactId, PortError> {
        let mut fields = Map::new();
        if let Some(id) = params.id {
            fields.insert("id".to_string(), json!(id.as_u32()));
        }
        if let Some(contact_type) = &params.contact_type {
            fields.insert("contact_type".to_string(), json!(contact_type));
        }
        fields.insert("first_name".to_string(), json!(params.first_name));
        fields.insert("last_name".to_string(), json!(params.last_name));
        fields.insert("email".to_string(), json!(params.email));
        fields.insert("display_name".to_string(), json!(params.display_name));
        fields.insert("contact_source".to_string(), json!(params.source));
        let envelope = self.call("Contact", "create", Value::Object(fields)).await?;
        req_u32(&envelope, "id").map(ContactId::new)
    }

    async fn list_addresses(&self, contact_id: ContactId) -> Result<Vec<AddressRecord>, PortError> {
        let envelope = self
            .call(
                "Address",
                "get",
                json!({ "contact_id": contact_id.as_u32(), "options": { "limit": 0 } }),
            )
            .await?;
        values_list(&envelope).iter().map(address_from).collect()
    }

    async fn save_address(&self, params: &AddressParams) -> Result<AddressId, PortError> {
        let mut fields = Map::new();
        if let Some(id) = params.id {
            fields.insert("id".to_string(), json!(id.as_u32()));
        }
        fields.insert("contact_id".to_string(), json!(params.contact_id.as_u32()));
        fields.insert(
            "location_type_id".to_string(),
            json!(params.location_type_id.as_u32()),
        );
        fields.insert("street_address".to_string(), json!(params.street_address));
        if let Some(supplemental) = &params.supplemental_address_1 {
            fields.insert("supplemental_address_1".to_string(), json!(supplemental));
        }
        fields.insert("city".to_string(), json!(params.city));
        fields.insert("postal_code".to_string(), json!(params.postal_code));
        if let Some(name) = &params.name {
            fields.insert("name".to_string(), json!(name));
        }
        if let Some(country_id) = params.country_id {
            fields.insert("country_id".to_string(), json!(country_id.as_u32()));
        }
        if let Some(state_id) = params.state_province_id {
            fields.insert("state_province_id".to_string(), json!(state_id.as_u32()));
        }
        let envelope = self.call("Address", "create", Value::Object(fields)).await?;
        req_u32(&envelope, "id").map(AddressId::new)
    }

    async fn list_phones(&self, contact_id: ContactId) -> Result<Vec<PhoneRecord>, PortError> {
        let envelope = self
            .call(
                "Phone",
                "get",
                json!({ "contact_id": contact_id.as_u32(), "options": { "limit": 0 } }),
            )
            .await?;
        values_list(&envelope).iter().map(phone_from).collect()
    }

    async fn save_phone(&self, params: &PhoneParams) -> Result<PhoneId, PortError> {
        let mut fields = Map::new();
        if let Some(id) = params.id {
            fields.insert("id".to_string(), json!(id.as_u32()));
        }
        fields.insert("contact_id".to_string(), json!(params.contact_id.as_u32()));
        fields.insert(
            "location_type_id".to_string(),
            json!(params.location_type_id.as_u32()),
        );
        fields.insert("phone_type_id".to_string(), json!(params.phone_type_id));
        fields.insert("phone".to_string(), json!(params.phone));
        let envelope = self.call("Phone", "create", Value::Object(fields)).await?;
        req_u32(&envelope, "id").map(PhoneId::new)
    }

    async fn list_emails(&self, contact_id: ContactId) -> Result<Vec<EmailRecord>, PortError> {
        let envelope = self
            .call(
                "Email",
                "get",
                json!({ "contact_id": contact_id.as_u32(), "options": { "limit": 0 } }),
            )
            .await?;
        values_list(&envelope).iter().map(email_from).collect()
    }

    async fn save_email(&self, params: &EmailParams) -> Result<EmailId, PortError> {
        let mut fields = Map::new();
        if let Some(id) = params.id {
            fields.insert("id".to_string(), json!(id.as_u32()));
        }
        fields.insert("contact_id".to_string(), json!(params.contact_id.as_u32()));
        fields.insert(
            "location_type_id".to_string(),
            json!(params.location_type_id.as_u32()),
        );
        fields.insert("email".to_string(), json!(params.email));
        let envelope = self.call("Email", "create", Value::Object(fields)).await?;
        req_u32(&envelope, "id").map(EmailId::new)
    }

    async fn find_contribution(
        &self,
        query: &ContributionQuery,
    ) -> Result<ContributionRecord, PortError> {
        let record = self
            .get_single("Contribution", json!({ "invoice_id": query.invoice_id }))
            .await?;
        contribution_from(&record)
    }

    async fn save_contribution(
        &self,
        params: &ContributionParams,
    ) -> Result<ContributionId, PortError> {
        let mut fields = Map::new();
        fields.insert("contact_id".to_string(), json!(params.contact_id.as_u32()));
        fields.insert(
            "financial_type_id".to_string(),
            json!(params.financial_type_id.as_u32()),
        );
        fields.insert(
            "payment_instrument_id".to_string(),
            json!(params.payment_instrument_id.as_u32()),
        );
        fields.insert(
            "total_amount".to_string(),
            json!(params.total_amount.to_string()),
        );
        fields.insert(
            "non_deductible_amount".to_string(),
            json!(params.non_deductible_amount.to_string()),
        );
        fields.insert(
            "fee_amount".to_string(),
            json!(params.fee_amount.to_string()),
        );
        fields.insert("trxn_id".to_string(), json!(params.trxn_id));
        fields.insert("invoice_id".to_string(), json!(params.invoice_id));
        fields.insert("source".to_string(), json!(params.source));
        fields.insert("note".to_string(), json!(params.note));
        fields.insert(
            "receive_date".to_string(),
            json!(params.receive_date.format("%Y-%m-%d %H:%M:%S").to_string()),
        );
        fields.insert(
            "contribution_status_id".to_string(),
            json!(params.status_id.as_u32()),
        );
        for custom in &params.custom_values {
            fields.insert(format!("custom_{}", custom.field.as_u32()), json!(custom.value));
        }
        let envelope = self
            .call("Contribution", "create", Value::Object(fields))
            .await?;
        req_u32(&envelope, "id").map(ContributionId::new)
    }

    async fn set_contribution_status(
        &self,
        id: ContributionId,
        status: ContributionStatusId,
    ) -> Result<(), PortError> {
        self.call(
            "Contribution",
            "create",
            json!({ "id": id.as_u32(), "contribution_status_id": status.as_u32() }),
        )
        .await
        .map(|_| ())
    }

    async fn create_custom_group(
        &self,
        params: &CustomGroupParams,
    ) -> Result<CustomGroupId, PortError> {
        let envelope = self
            .call(
                "CustomGroup",
                "create",
                json!({
                    "title": params.title,
                    "name": params.name,
                    "extends": params.extends,
                    "weight": params.weight,
                    "collapse_display": params.collapse_display as u32,
                    "is_active": params.is_active as u32,
                }),
            )
            .await?;
        req_u32(&envelope, "id").map(CustomGroupId::new)
    }

    async fn create_custom_field(
        &self,
        params: &CustomFieldParams,
    ) -> Result<CustomFieldId, PortError> {
        let envelope = self
            .call(
                "CustomField",
                "create",
                json!({
                    "custom_group_id": params.custom_group_id.as_u32(),
                    "label": params.label,
                    "html_type": params.html_type,
                    "data_type": params.data_type,
                    "weight": params.weight,
                    "is_required": params.is_required as u32,
                    "is_searchable": params.is_searchable as u32,
                    "is_active": params.is_active as u32,
                }),
            )
            .await?;
        req_u32(&envelope, "id").map(CustomFieldId::new)
    }

    async fn list_location_types(&self) -> Result<Vec<LocationTypeRecord>, PortError> {
        let envelope = self
            .call("LocationType", "get", json!({ "options": { "limit": 0 } }))
            .await?;
        values_list(&envelope)
            .iter()
            .map(|v| {
                Ok(LocationTypeRecord {
                    id: req_u32(v, "id").map(LocationTypeId::new)?,
                    name: text(&v["name"]),
                })
            })
            .collect()
    }

    async fn find_country(&self, iso_code: &str) -> Result<CountryId, PortError> {
        let record = self
            .get_single("Country", json!({ "iso_code": iso_code }))
            .await?;
        req_u32(&record, "id").map(CountryId::new)
    }

    async fn find_state_province(
        &self,
        abbreviation: &str,
        country_id: CountryId,
    ) -> Result<StateProvinceId, PortError> {
        let record = self
            .get_single(
                "StateProvince",
                json!({ "abbreviation": abbreviation, "country_id": country_id.as_u32() }),
            )
            .await?;
        req_u32(&record, "id").map(StateProvinceId::new)
    }
}

fn transport_error(operation: &str, error: reqwest::Error) -> PortError {
    if error.is_timeout() {
        PortError::Timeout {
            operation: operation.to_string(),
        }
    } else {
        PortError::Connection {
            message: format!("{operation}: {error}"),
            source: Some(Box::new(error)),
        }
    }
}

fn status_error(operation: &str, status: StatusCode) -> PortError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized {
            message: format!("{operation} rejected with HTTP {status}"),
        },
        StatusCode::TOO_MANY_REQUESTS => PortError::RateLimited,
        s if s.is_server_error() => PortError::ServiceUnavailable {
            service: "CRM".to_string(),
        },
        s => PortError::remote_fault(format!("{operation} returned HTTP {s}")),
    }
}

/// Reads a numeric field the CRM may encode as a number or a string
fn opt_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn req_u32(record: &Value, field: &str) -> Result<u32, PortError> {
    opt_u32(&record[field])
        .ok_or_else(|| PortError::remote_fault(format!("CRM response is missing {field}")))
}

fn opt_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Reads a textual field, treating absent as empty (the CRM does both)
fn text(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}

fn opt_text(value: &Value) -> Option<String> {
    value.as_str().filter(|s| !s.is_empty()).map(str::to_string)
}

/// Extracts the record set from a `get` envelope
///
/// The CRM keys `values` by record id; some actions return a plain array.
fn values_list(envelope: &Value) -> Vec<Value> {
    match &envelope["values"] {
        Value::Object(map) => map.values().cloned().collect(),
        Value::Array(list) => list.clone(),
        _ => Vec::new(),
    }
}

fn contact_from(record: &Value) -> Result<ContactRecord, PortError> {
    Ok(ContactRecord {
        id: req_u32(record, "id").map(ContactId::new)?,
        first_name: text(&record["first_name"]),
        last_name: text(&record["last_name"]),
        display_name: text(&record["display_name"]),
        email: opt_text(&record["email"]),
        source: opt_text(&record["contact_source"]).or_else(|| opt_text(&record["source"])),
    })
}

fn address_from(record: &Value) -> Result<AddressRecord, PortError> {
    Ok(AddressRecord {
        id: req_u32(record, "id").map(AddressId::new)?,
        location_type_id: opt_u32(&record["location_type_id"]).map(LocationTypeId::new),
        street_address: text(&record["street_address"]),
        supplemental_address_1: opt_text(&record["supplemental_address_1"]),
        city: text(&record["city"]),
        postal_code: text(&record["postal_code"]),
    })
}

fn phone_from(record: &Value) -> Result<PhoneRecord, PortError> {
    Ok(PhoneRecord {
        id: req_u32(record, "id").map(PhoneId::new)?,
        location_type_id: opt_u32(&record["location_type_id"]).map(LocationTypeId::new),
        phone: text(&record["phone"]),
    })
}

fn email_from(record: &Value) -> Result<EmailRecord, PortError> {
    Ok(EmailRecord {
        id: req_u32(record, "id").map(EmailId::new)?,
        location_type_id: opt_u32(&record["location_type_id"]).map(LocationTypeId::new),
        email: text(&record["email"]),
    })
}

fn contribution_from(record: &Value) -> Result<ContributionRecord, PortError> {
    Ok(ContributionRecord {
        id: req_u32(record, "id").map(ContributionId::new)?,
        contact_id: req_u32(record, "contact_id").map(ContactId::new)?,
        status_id: req_u32(record, "contribution_status_id").map(ContributionStatusId::new)?,
        invoice_id: text(&record["invoice_id"]),
        total_amount: opt_decimal(&record["total_amount"]).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_numeric_fields_accept_both_encodings() {
        assert_eq!(opt_u32(&json!(42)), Some(42));
        assert_eq!(opt_u32(&json!("42")), Some(42));
        assert_eq!(opt_u32(&json!("not a number")), None);
        assert_eq!(opt_u32(&Value::Null), None);

        assert_eq!(opt_decimal(&json!("45.50")), Some(dec!(45.50)));
        assert_eq!(opt_decimal(&json!(45.5)), Some(dec!(45.5)));
    }

    #[test]
    fn test_values_list_handles_keyed_objects_and_arrays() {
        let keyed = json!({ "values": { "7": { "id": "7" }, "9": { "id": "9" } } });
        assert_eq!(values_list(&keyed).len(), 2);

        let array = json!({ "values": [{ "id": 1 }] });
        assert_eq!(values_list(&array).len(), 1);

        assert!(values_list(&json!({ "is_error": 0 })).is_empty());
    }

    #[test]
    fn test_contribution_record_parses_string_typed_envelope() {
        let record = json!({
            "id": "311",
            "contact_id": "42",
            "contribution_status_id": "5",
            "invoice_id": "792_woocommerce",
            "total_amount": "40.00",
        });
        let parsed = contribution_from(&record).unwrap();
        assert_eq!(parsed.id.as_u32(), 311);
        assert_eq!(parsed.status_id.as_u32(), 5);
        assert_eq!(parsed.total_amount, dec!(40.00));
    }

    #[test]
    fn test_contact_record_tolerates_missing_optionals() {
        let record = json!({ "id": 7, "first_name": "Jane", "last_name": "Doe" });
        let parsed = contact_from(&record).unwrap();
        assert_eq!(parsed.email, None);
        assert_eq!(parsed.source, None);
        assert_eq!(parsed.display_name, "");
    }

    #[test]
    fn test_missing_id_is_a_remote_fault() {
        let record = json!({ "first_name": "Jane" });
        assert!(contact_from(&record).is_err());
    }
}
