//! Location resolver endpoints.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::Caller;
use crate::api::dto::{
    BatchRequest, BatchResponse, DistanceDto, DistanceQuery, DistanceResponse, GeocodeRequest,
    ReverseRequest, ReverseResponse, TextRequest,
};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, HubError};
use crate::location::{Coordinates, ExtractedPlace, GeocodeOutcome, KM_TO_MILES, ProcessOutcome};

fn non_blank<'a>(field: &str, value: &'a str) -> Result<&'a str, HubError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(HubError::Validation(format!("{field} is required")));
    }
    Ok(value)
}

fn valid_coordinates(lat: f64, lng: f64) -> Result<Coordinates, HubError> {
    let coordinates = Coordinates::new(lat, lng);
    if !coordinates.is_valid() {
        return Err(HubError::Validation(format!(
            "coordinates out of range: {lat}, {lng}"
        )));
    }
    Ok(coordinates)
}

/// `POST /geocoding/extract` — Extract a place name from text.
///
/// # Errors
///
/// Returns [`HubError::Validation`] if `text` is blank.
#[utoipa::path(
    post,
    path = "/api/v1/geocoding/extract",
    tag = "Geocoding",
    summary = "Extract a place name",
    description = "Best-effort extraction. Provider failures and low-confidence answers yield `Unknown location`.",
    request_body = TextRequest,
    responses(
        (status = 200, description = "Extracted place", body = ExtractedPlace),
        (status = 400, description = "Blank text", body = ErrorResponse),
    )
)]
pub async fn extract(
    State(state): State<AppState>,
    Caller(_user): Caller,
    Json(req): Json<TextRequest>,
) -> Result<impl IntoResponse, HubError> {
    let text = non_blank("text", &req.text)?;
    Ok(Json(state.resolver.extract_place(text).await))
}

/// `POST /geocoding/geocode` — Resolve a place name to coordinates.
///
/// # Errors
///
/// Returns [`HubError::Validation`] if `location` is blank.
#[utoipa::path(
    post,
    path = "/api/v1/geocoding/geocode",
    tag = "Geocoding",
    summary = "Geocode a place name",
    description = "Provider failures are reported as `success = false`, never as an error status.",
    request_body = GeocodeRequest,
    responses(
        (status = 200, description = "Geocoding outcome", body = GeocodeOutcome),
        (status = 400, description = "Blank location", body = ErrorResponse),
    )
)]
pub async fn geocode(
    State(state): State<AppState>,
    Caller(_user): Caller,
    Json(req): Json<GeocodeRequest>,
) -> Result<impl IntoResponse, HubError> {
    let location = non_blank("location", &req.location)?;
    Ok(Json(state.resolver.geocode(location).await))
}

/// `POST /geocoding/reverse` — Describe the place at a position.
///
/// # Errors
///
/// Returns [`HubError::Validation`] for out-of-range coordinates.
#[utoipa::path(
    post,
    path = "/api/v1/geocoding/reverse",
    tag = "Geocoding",
    summary = "Reverse geocode",
    request_body = ReverseRequest,
    responses(
        (status = 200, description = "Address", body = ReverseResponse),
        (status = 400, description = "Invalid coordinates", body = ErrorResponse),
    )
)]
pub async fn reverse(
    State(state): State<AppState>,
    Caller(_user): Caller,
    Json(req): Json<ReverseRequest>,
) -> Result<impl IntoResponse, HubError> {
    let coordinates = valid_coordinates(req.lat, req.lng)?;
    let address = state.resolver.reverse_geocode(coordinates).await;
    Ok(Json(ReverseResponse {
        coordinates,
        address,
    }))
}

/// `POST /geocoding/process` — Extract then geocode.
///
/// # Errors
///
/// Returns [`HubError::Validation`] if `text` is blank.
#[utoipa::path(
    post,
    path = "/api/v1/geocoding/process",
    tag = "Geocoding",
    summary = "Extract and geocode",
    request_body = TextRequest,
    responses(
        (status = 200, description = "Combined outcome", body = ProcessOutcome),
        (status = 400, description = "Blank text", body = ErrorResponse),
    )
)]
pub async fn process(
    State(state): State<AppState>,
    Caller(_user): Caller,
    Json(req): Json<TextRequest>,
) -> Result<impl IntoResponse, HubError> {
    let text = non_blank("text", &req.text)?;
    Ok(Json(state.resolver.process(text).await))
}

/// `POST /geocoding/batch` — Geocode up to ten places.
///
/// # Errors
///
/// Returns [`HubError::Validation`] for an empty or oversized batch.
#[utoipa::path(
    post,
    path = "/api/v1/geocoding/batch",
    tag = "Geocoding",
    summary = "Batch geocode",
    request_body = BatchRequest,
    responses(
        (status = 200, description = "Per-place outcomes", body = BatchResponse),
        (status = 400, description = "Empty or oversized batch", body = ErrorResponse),
    )
)]
pub async fn batch(
    State(state): State<AppState>,
    Caller(_user): Caller,
    Json(req): Json<BatchRequest>,
) -> Result<impl IntoResponse, HubError> {
    let results = state.resolver.batch_geocode(&req.locations).await?;
    Ok(Json(BatchResponse::from(results)))
}

/// `GET /geocoding/distance` — Great-circle distance between two points.
///
/// # Errors
///
/// Returns [`HubError::Validation`] for out-of-range coordinates.
#[utoipa::path(
    get,
    path = "/api/v1/geocoding/distance",
    tag = "Geocoding",
    summary = "Distance between two points",
    params(DistanceQuery),
    responses(
        (status = 200, description = "Distance", body = DistanceResponse),
        (status = 400, description = "Invalid coordinates", body = ErrorResponse),
    )
)]
pub async fn distance(
    State(state): State<AppState>,
    Caller(_user): Caller,
    Query(q): Query<DistanceQuery>,
) -> Result<impl IntoResponse, HubError> {
    let from = valid_coordinates(q.lat1, q.lng1)?;
    let to = valid_coordinates(q.lat2, q.lng2)?;
    let kilometers = state.resolver.distance(from.lat, from.lng, to.lat, to.lng);
    Ok(Json(DistanceResponse {
        from,
        to,
        distance: DistanceDto {
            kilometers,
            miles: kilometers * KM_TO_MILES,
            meters: kilometers * 1000.0,
        },
    }))
}

/// Geocoding routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/geocoding/extract", post(extract))
        .route("/geocoding/geocode", post(geocode))
        .route("/geocoding/reverse", post(reverse))
        .route("/geocoding/process", post(process))
        .route("/geocoding/batch", post(batch))
        .route("/geocoding/distance", get(distance))
}
