//! Hub endpoints: urgent alerts and monitoring introspection.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::api::auth::Caller;
use crate::api::dto::{AlertRequest, AlertResponse, MonitoringListResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, HubError};

/// `POST /alerts` — Broadcast an urgent alert to every connected client.
///
/// # Errors
///
/// Returns [`HubError::Validation`] if the message is blank.
#[utoipa::path(
    post,
    path = "/api/v1/alerts",
    tag = "Hub",
    summary = "Broadcast an urgent alert",
    description = "Delivers an `urgent_alert` event to every connected WebSocket client regardless of room membership.",
    request_body = AlertRequest,
    responses(
        (status = 200, description = "Alert queued", body = AlertResponse),
        (status = 400, description = "Blank message", body = ErrorResponse),
        (status = 401, description = "Unknown caller", body = ErrorResponse),
    )
)]
pub async fn post_alert(
    State(state): State<AppState>,
    Caller(user): Caller,
    Json(req): Json<AlertRequest>,
) -> Result<impl IntoResponse, HubError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(HubError::Validation("message is required".to_string()));
    }
    let delivered = state
        .hub
        .publish_global(
            req.disaster_id,
            json!({
                "message": message,
                "location": req.location,
                "source": user.id,
            }),
        )
        .await;
    tracing::warn!(user_id = %user.id, delivered, "urgent alert broadcast");
    Ok(Json(AlertResponse { delivered }))
}

/// `GET /monitoring` — List running monitoring sessions.
///
/// # Errors
///
/// Returns [`HubError::Unauthorized`] for an unknown caller.
#[utoipa::path(
    get,
    path = "/api/v1/monitoring",
    tag = "Hub",
    summary = "List monitoring sessions",
    responses(
        (status = 200, description = "Running sessions", body = MonitoringListResponse),
        (status = 401, description = "Unknown caller", body = ErrorResponse),
    )
)]
pub async fn list_monitoring(
    State(state): State<AppState>,
    Caller(_user): Caller,
) -> Result<impl IntoResponse, HubError> {
    let sessions = state.hub.active_sessions().await;
    Ok(Json(MonitoringListResponse {
        count: sessions.len(),
        sessions,
    }))
}

/// Hub routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/alerts", post(post_alert))
        .route("/monitoring", get(list_monitoring))
}
