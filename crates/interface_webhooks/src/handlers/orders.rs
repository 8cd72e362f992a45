//! Order webhook handlers
//!
//! Both endpoints verify the delivery signature against the raw body before
//! touching the JSON. A delivery that authenticates and parses is always
//! acknowledged with 200, even when the sync behind it fails; the storefront
//! retries non-2xx deliveries, and replaying an order whose CRM write already
//! half-succeeded would not make the data better. Failures are logged for
//! the operator instead.

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde::Serialize;
use tracing::{error, info};

use domain_sync::Order;

use crate::dto::OrderPayload;
use crate::error::ApiError;
use crate::signature;
use crate::AppState;

#[derive(Serialize)]
pub struct WebhookResponse {
    pub status: String,
}

fn authenticate(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<(), ApiError> {
    let header = headers
        .get(signature::SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    if !signature::verify(&state.webhook_secret, body, header) {
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}

fn parse_order(body: &[u8]) -> Result<Order, ApiError> {
    let payload: OrderPayload = serde_json::from_slice(body)
        .map_err(|e| ApiError::Validation(format!("malformed order payload: {e}")))?;
    Order::try_from(payload)
}

/// Handles the order-finalized delivery
pub async fn order_created(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    authenticate(&state, &headers, &body)?;
    let order = parse_order(&body)?;

    let status = match state.engine.order_finalized(&order).await {
        Ok(outcome) => {
            info!(order_id = %order.id, contact_id = %outcome.contact_id, "order synced");
            "synced"
        }
        Err(e) => {
            error!(order_id = %order.id, error = %e, "order sync failed");
            "failed"
        }
    };
    Ok(Json(WebhookResponse {
        status: status.to_string(),
    }))
}

/// Handles the order-updated delivery by pushing the status change
pub async fn order_updated(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    authenticate(&state, &headers, &body)?;
    let order = parse_order(&body)?;

    state.engine.order_status_changed(order.id, &order.status).await;
    Ok(Json(WebhookResponse {
        status: "accepted".to_string(),
    }))
}
