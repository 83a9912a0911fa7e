//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1` and require an
//! `x-user-id` header; `/health` and `/ws` sit at the root.

pub mod auth;
pub mod dto;
pub mod handlers;
pub mod openapi;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
        .merge(docs_router())
}

#[cfg(feature = "swagger-ui")]
fn docs_router() -> Router<AppState> {
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

#[cfg(not(feature = "swagger-ui"))]
fn docs_router() -> Router<AppState> {
    use axum::Json;
    use utoipa::OpenApi;

    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(openapi::ApiDoc::openapi()) }),
    )
}

/// Builds the full application: REST, docs and the `/ws` endpoint, with
/// request tracing, a per-request timeout and permissive CORS.
pub fn build_app(state: AppState) -> Router {
    let timeout = state.request_timeout;
    Router::new()
        .merge(build_router())
        .route("/ws", get(ws_handler))
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::hub::EventHub;
    use crate::location::LocationResolver;
    use crate::persistence::InMemoryStorage;

    fn app() -> Router {
        let state = AppState::new(
            Arc::new(InMemoryStorage::new()),
            LocationResolver::offline(),
            EventHub::new(8, Duration::from_secs(30)),
            50.0,
        );
        build_app(state)
    }

    async fn call(method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(auth::USER_HEADER, "citizen1")
            .body(Body::empty());
        let Ok(request) = request else {
            panic!("request should build");
        };
        let response = app()
            .oneshot(request)
            .await
            .unwrap_or_else(|never| match never {});
        let status = response.status();
        let Ok(bytes) = to_bytes(response.into_body(), 64 * 1024).await else {
            panic!("body should read");
        };
        let Ok(body) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
            panic!("error body should be JSON: {bytes:?}");
        };
        (status, body)
    }

    #[tokio::test]
    async fn malformed_id_is_a_json_validation_error() {
        for (method, uri) in [
            ("GET", "/api/v1/disasters/not-a-uuid"),
            ("DELETE", "/api/v1/disasters/12345"),
            ("GET", "/api/v1/disasters/nope/audit"),
        ] {
            let (status, body) = call(method, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
            assert_eq!(body["error"]["code"], 1001);
            assert!(body["error"]["message"].is_string());
        }
    }

    #[tokio::test]
    async fn unknown_well_formed_id_is_not_found() {
        let uri = format!("/api/v1/disasters/{}", uuid::Uuid::new_v4());
        let (status, body) = call("GET", &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], 2001);
    }
}
