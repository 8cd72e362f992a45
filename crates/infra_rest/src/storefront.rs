//! Storefront REST Adapter
//!
//! Two small pieces of plumbing toward the storefront side of the sync:
//! appending order notes through the storefront's REST API, and resolving a
//! storefront customer to a CRM contact through the CRM's user-account
//! mapping table.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::debug;

use core_kernel::{
    AdapterHealth, ContactId, DomainPort, ExternalAuthConfig, ExternalSystemConfig,
    HealthCheckResult, HealthCheckable, OrderId, PortError,
};
use domain_sync::ports::{ContactResolver, StorefrontPort};
use domain_sync::Order;

use crate::crm::CiviCrmRestAdapter;

/// REST adapter for the storefront's order API
///
/// The base URL must point at the storefront's v3 REST root
/// (`https://shop.example.org/wp-json/wc/v3`); authentication is the
/// storefront's consumer key/secret pair over basic auth.
pub struct WooRestAdapter {
    client: reqwest::Client,
    base_url: String,
    consumer_key: String,
    consumer_secret: String,
}

impl WooRestAdapter {
    pub fn new(config: ExternalSystemConfig) -> Result<Self, PortError> {
        let ExternalAuthConfig::Basic { username, password } = config.auth else {
            return Err(PortError::validation(
                "storefront adapter requires basic authentication",
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
            consumer_key: username,
            consumer_secret: password,
        })
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<(), PortError> {
        let url = format!("{}/{path}", self.base_url.trim_end_matches('/'));
        debug!(%url, "storefront call");
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.consumer_key, Some(&self.consumer_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PortError::Timeout {
                        operation: path.to_string(),
                    }
                } else {
                    PortError::Connection {
                        message: format!("{path}: {e}"),
                        source: Some(Box::new(e)),
                    }
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        match status.as_u16() {
            401 | 403 => Err(PortError::Unauthorized {
                message: format!("{path} rejected with HTTP {status}"),
            }),
            404 => Err(PortError::not_found("Order", path)),
            429 => Err(PortError::RateLimited),
            500..=599 => Err(PortError::ServiceUnavailable {
                service: "storefront".to_string(),
            }),
            _ => Err(PortError::remote_fault(format!(
                "{path} returned HTTP {status}"
            ))),
        }
    }
}

impl DomainPort for WooRestAdapter {}

#[async_trait]
impl HealthCheckable for WooRestAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        // HEAD against the API root checks reachability and credentials.
        let url = self.base_url.trim_end_matches('/').to_string();
        let result = self
            .client
            .head(&url)
            .basic_auth(&self.consumer_key, Some(&self.consumer_secret))
            .send()
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;
        let (status, message) = match result {
            Ok(r) if r.status().is_success() => (AdapterHealth::Healthy, None),
            Ok(r) => (
                AdapterHealth::Degraded,
                Some(format!("storefront returned HTTP {}", r.status())),
            ),
            Err(e) => (AdapterHealth::Unhealthy, Some(e.to_string())),
        };
        HealthCheckResult {
            adapter_id: "woo-rest-adapter".to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl StorefrontPort for WooRestAdapter {
    async fn add_order_note(&self, order_id: OrderId, note: &str) -> Result<(), PortError> {
        self.post(
            &format!("orders/{order_id}/notes"),
            json!({ "note": note, "customer_note": false }),
        )
        .await
    }
}

/// Resolves storefront customers through the CRM's user-account mapping
///
/// Guest checkouts carry no customer id and resolve to `None`; so does a
/// logged-in customer the CRM has never seen.
pub struct UfMatchResolver {
    crm: Arc<CiviCrmRestAdapter>,
}

impl UfMatchResolver {
    pub fn new(crm: Arc<CiviCrmRestAdapter>) -> Self {
        Self { crm }
    }
}

impl DomainPort for UfMatchResolver {}

#[async_trait]
impl ContactResolver for UfMatchResolver {
    async fn resolve(&self, order: &Order) -> Result<Option<ContactId>, PortError> {
        let Some(customer_id) = order.customer_id else {
            return Ok(None);
        };
        match self.crm.uf_match_contact(customer_id).await {
            Ok(contact_id) => Ok(Some(contact_id)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
