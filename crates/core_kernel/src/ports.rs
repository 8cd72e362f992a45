//! Ports and Adapters Infrastructure
//!
//! Foundational types for the hexagonal architecture used across the sync
//! service. The domain crate defines port traits (`CrmPort`,
//! `StorefrontPort`, ...) in terms of the error and health types here; the
//! infrastructure crate provides REST adapters implementing them, and tests
//! swap in in-memory mocks.
//!
//! All port operations return `Result<_, PortError>`, replacing the
//! exception-per-call style of the systems this service talks to with
//! explicit results that call sites pattern-match on.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type for port operations
///
/// Unified error type used by every port implementation, so that engine code
/// can classify a failure (not-found vs. transient vs. remote fault) without
/// knowing which adapter produced it.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} matching {query}")]
    NotFound { entity_type: String, query: String },

    /// A validation error occurred before any remote call was made
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Connection to the remote system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The operation timed out
    #[error("Timeout during {operation}")]
    Timeout { operation: String },

    /// Authentication or authorization failed
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Rate limit exceeded on the remote API
    #[error("Rate limited by remote API")]
    RateLimited,

    /// The remote system is unavailable
    #[error("Service unavailable: {service}")]
    ServiceUnavailable { service: String },

    /// The remote API accepted the request but reported a fault
    ///
    /// The CRM's fault responses carry a human-readable message only, no
    /// structured error code.
    #[error("Remote API fault: {message}")]
    RemoteFault { message: String },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, query: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            query: query.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a RemoteFault error
    pub fn remote_fault(message: impl Into<String>) -> Self {
        PortError::RemoteFault {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error indicates a transient failure that may
    /// succeed if the caller tries again later
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Connection { .. }
                | PortError::Timeout { .. }
                | PortError::RateLimited
                | PortError::ServiceUnavailable { .. }
        )
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }
}

/// Marker trait for all domain ports
///
/// Port traits extend this marker so implementations are thread-safe and
/// usable from async contexts.
pub trait DomainPort: Send + Sync + 'static {}

/// Connection settings for an external REST API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalSystemConfig {
    /// Base URL of the remote system
    pub base_url: String,
    /// Authentication configuration
    pub auth: ExternalAuthConfig,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ExternalSystemConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth: ExternalAuthConfig::None,
            timeout_secs: 30,
        }
    }
}

/// Authentication configuration for external systems
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExternalAuthConfig {
    /// No authentication required
    None,
    /// CRM-style dual key: a per-user API key plus a site key
    ApiKeyPair {
        #[serde(skip_serializing)]
        api_key: String,
        #[serde(skip_serializing)]
        site_key: String,
    },
    /// Basic authentication (storefront consumer key/secret)
    Basic {
        username: String,
        #[serde(skip_serializing)]
        password: String,
    },
}

/// Health status for an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    /// Adapter is healthy and operational
    Healthy,
    /// Adapter is degraded but operational
    Degraded,
    /// Adapter is unhealthy and not operational
    Unhealthy,
}

/// Health check result for an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Adapter identifier
    pub adapter_id: String,
    /// Current health status
    pub status: AdapterHealth,
    /// Latency of the health check in milliseconds
    pub latency_ms: u64,
    /// Optional message with additional details
    pub message: Option<String>,
    /// Timestamp of the health check
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

/// Trait for adapters that support health checks
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    /// Performs a health check on the adapter
    async fn health_check(&self) -> HealthCheckResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_not_found() {
        let error = PortError::not_found("Contribution", "invoice_id=7_woocommerce");
        assert!(error.is_not_found());
        assert!(!error.is_transient());
        assert!(error.to_string().contains("Contribution"));
        assert!(error.to_string().contains("7_woocommerce"));
    }

    #[test]
    fn test_port_error_transient() {
        let timeout = PortError::Timeout {
            operation: "Contact.create".to_string(),
        };
        assert!(timeout.is_transient());
        assert!(PortError::RateLimited.is_transient());

        let fault = PortError::remote_fault("DB Error: constraint violation");
        assert!(!fault.is_transient());
        assert!(!fault.is_not_found());
    }

    #[test]
    fn test_auth_config_secrets_not_serialized() {
        let auth = ExternalAuthConfig::ApiKeyPair {
            api_key: "user-key".to_string(),
            site_key: "site-key".to_string(),
        };
        let json = serde_json::to_string(&auth).unwrap();
        assert!(!json.contains("user-key"));
        assert!(!json.contains("site-key"));
    }
}
