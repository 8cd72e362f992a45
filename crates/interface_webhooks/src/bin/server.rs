//! Order Sync - Webhook Server Binary
//!
//! This binary starts the HTTP server that receives the storefront's order
//! webhooks and syncs them into the CRM.
//!
//! # Usage
//!
//! ```bash
//! # Run with environment variables
//! SYNC_CRM_REST_URL=https://crm.example.org/civicrm/extern/rest.php \
//! SYNC_CRM_API_KEY=... SYNC_CRM_SITE_KEY=... \
//! SYNC_WOO_API_URL=https://shop.example.org/wp-json/wc/v3 \
//! SYNC_WOO_CONSUMER_KEY=... SYNC_WOO_CONSUMER_SECRET=... \
//! SYNC_WEBHOOK_SECRET=... SYNC_CRM_ADMIN_URL=https://crm.example.org/wp-admin/ \
//! cargo run --bin order-sync
//! ```
//!
//! # Environment Variables
//!
//! * `SYNC_HOST` - Server host (default: 0.0.0.0)
//! * `SYNC_PORT` - Server port (default: 8080)
//! * `SYNC_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `SYNC_WEBHOOK_SECRET` - Shared secret for webhook signatures (required)
//! * `SYNC_CRM_REST_URL` - CRM REST endpoint (required)
//! * `SYNC_CRM_API_KEY` / `SYNC_CRM_SITE_KEY` - CRM credentials (required)
//! * `SYNC_CRM_ADMIN_URL` - CRM admin base URL for note deep links (required)
//! * `SYNC_WOO_API_URL` - Storefront REST root (required)
//! * `SYNC_WOO_CONSUMER_KEY` / `SYNC_WOO_CONSUMER_SECRET` - Storefront credentials (required)
//! * `SYNC_SETTINGS_PATH` - JSON settings file (default: sync-settings.json)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use domain_sync::{EngineConfig, NoopHooks, OrderSyncEngine, SyncSettings};
use infra_rest::{CiviCrmRestAdapter, JsonFileSettings, UfMatchResolver, WooRestAdapter};
use interface_webhooks::{config::SyncConfig, create_router, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = SyncConfig::from_env().context("could not load SYNC_* configuration")?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting order sync webhook server"
    );

    let crm = Arc::new(
        CiviCrmRestAdapter::new(config.crm_config())
            .context("could not build the CRM adapter")?,
    );
    let storefront = Arc::new(
        WooRestAdapter::new(config.woo_config())
            .context("could not build the storefront adapter")?,
    );
    let resolver = Arc::new(UfMatchResolver::new(crm.clone()));
    let settings = SyncSettings::new(Arc::new(
        JsonFileSettings::open(&config.settings_path)
            .context("could not open the settings file")?,
    ));

    let engine = Arc::new(OrderSyncEngine::new(
        crm.clone(),
        storefront,
        resolver,
        settings,
        Arc::new(NoopHooks),
        EngineConfig {
            admin_url: config.crm_admin_url.clone(),
        },
    ));

    let state = AppState {
        engine,
        crm_health: crm,
        webhook_secret: config.webhook_secret.clone(),
    };
    let app = create_router(state);

    let addr: SocketAddr = config.server_addr().parse()?;
    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// This enables graceful shutdown of the server, allowing in-flight
/// requests to complete before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
