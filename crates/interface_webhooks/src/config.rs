//! Service configuration

use core_kernel::{ExternalAuthConfig, ExternalSystemConfig};
use serde::Deserialize;

fn default_timeout_secs() -> u64 {
    30
}

/// Webhook service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Log level
    pub log_level: String,
    /// Shared secret the storefront signs webhook deliveries with
    pub webhook_secret: String,
    /// CRM REST endpoint URL
    pub crm_rest_url: String,
    /// CRM per-user API key
    pub crm_api_key: String,
    /// CRM site key
    pub crm_site_key: String,
    /// CRM admin base URL, used for deep links in order notes
    pub crm_admin_url: String,
    /// Storefront REST API root (".../wp-json/wc/v3")
    pub woo_api_url: String,
    /// Storefront consumer key
    pub woo_consumer_key: String,
    /// Storefront consumer secret
    pub woo_consumer_secret: String,
    /// Path of the JSON settings file
    pub settings_path: String,
    /// Outbound request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SyncConfig {
    /// Loads configuration from `SYNC_*` environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("SYNC"))
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080)?
            .set_default("log_level", "info")?
            .set_default("settings_path", "sync-settings.json")?
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connection settings for the CRM adapter
    pub fn crm_config(&self) -> ExternalSystemConfig {
        ExternalSystemConfig {
            base_url: self.crm_rest_url.clone(),
            auth: ExternalAuthConfig::ApiKeyPair {
                api_key: self.crm_api_key.clone(),
                site_key: self.crm_site_key.clone(),
            },
            timeout_secs: self.timeout_secs,
        }
    }

    /// Connection settings for the storefront adapter
    pub fn woo_config(&self) -> ExternalSystemConfig {
        ExternalSystemConfig {
            base_url: self.woo_api_url.clone(),
            auth: ExternalAuthConfig::Basic {
                username: self.woo_consumer_key.clone(),
                password: self.woo_consumer_secret.clone(),
            },
            timeout_secs: self.timeout_secs,
        }
    }
}
