//! HTTP Webhook Layer
//!
//! This crate exposes the storefront-facing surface of the sync service
//! using Axum: two signed webhook endpoints that drive the
//! [`OrderSyncEngine`], plus health endpoints for orchestration.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_webhooks::{create_router, AppState};
//!
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod signature;

use std::sync::Arc;

use axum::{routing::get, routing::post, Router};
use core_kernel::HealthCheckable;
use domain_sync::OrderSyncEngine;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, orders};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<OrderSyncEngine>,
    pub crm_health: Arc<dyn HealthCheckable>,
    pub webhook_secret: String,
}

/// Creates the webhook router
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let webhook_routes = Router::new()
        .route("/order-created", post(orders::order_created))
        .route("/order-updated", post(orders::order_updated));

    Router::new()
        .merge(public_routes)
        .nest("/webhooks", webhook_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
