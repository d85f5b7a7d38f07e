//! HTTP handlers.
//!
//! Three routes: a health probe, the event intake, and a manual test
//! send. Intake is fire-and-forget: the event is dispatched inline and
//! the response is 202 regardless of delivery outcome, so callers are
//! never coupled to Slack availability.

use crate::events::NotificationEvent;
use crate::service::AppState;
use crate::{HealthStatus, NotifierError, SERVICE_NAME, VERSION};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = HealthStatus {
        service: SERVICE_NAME.to_string(),
        version: VERSION.to_string(),
        delivery_configured: state.config.delivery_configured(),
    };
    Json(status)
}

/// POST /events
///
/// Accepts one lifecycle event and dispatches it. Delivery failures are
/// logged by the router, never surfaced here.
pub async fn ingest_event(
    State(state): State<Arc<AppState>>,
    Json(event): Json<NotificationEvent>,
) -> impl IntoResponse {
    let kind = event.kind();
    info!(event = kind, "event received");

    state.router.dispatch(event).await;

    (
        StatusCode::ACCEPTED,
        Json(json!({
            "accepted": true,
            "event": kind,
        })),
    )
}

/// POST /test
///
/// Sends the fixed test message to the general channel. Unlike intake,
/// failures are surfaced so an operator can verify their configuration.
pub async fn send_test(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, NotifierError> {
    let ts = state.router.send_test_message().await?;
    Ok(Json(json!({
        "ok": true,
        "ts": ts,
    })))
}
