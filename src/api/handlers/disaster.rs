//! Disaster CRUD handlers: create, list, get, update, delete, audit.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::auth::{Caller, DisasterPath};
use crate::api::dto::{
    DeleteDisasterResponse, DisasterListResponse, ListDisastersQuery, PaginationParams,
};
use crate::app_state::AppState;
use crate::domain::{
    AuditEntry, Disaster, DisasterFilter, DisasterPatch, NearFilter, NewDisaster,
};
use crate::error::{ErrorResponse, HubError};
use crate::location::Coordinates;
use crate::service::CreatedDisaster;

/// `POST /disasters` — Create a disaster.
///
/// # Errors
///
/// Returns [`HubError`] on missing fields or storage failure.
#[utoipa::path(
    post,
    path = "/api/v1/disasters",
    tag = "Disasters",
    summary = "Create a disaster",
    description = "Creates a disaster owned by the caller. Without `location_name` the place is extracted from the description; geocoding failures leave the coordinates empty.",
    request_body = NewDisaster,
    responses(
        (status = 201, description = "Disaster created", body = CreatedDisaster),
        (status = 400, description = "Missing title or description", body = ErrorResponse),
        (status = 401, description = "Unknown caller", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse),
    )
)]
pub async fn create_disaster(
    State(state): State<AppState>,
    Caller(user): Caller,
    Json(req): Json<NewDisaster>,
) -> Result<impl IntoResponse, HubError> {
    let created = state.disaster_service.create(&user, req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /disasters` — List disasters, optionally by tag and proximity.
///
/// # Errors
///
/// Returns [`HubError`] on an incomplete proximity query or storage
/// failure.
#[utoipa::path(
    get,
    path = "/api/v1/disasters",
    tag = "Disasters",
    summary = "List disasters",
    description = "Returns a paginated list of disasters. With `lat` and `lng` only geocoded disasters within `radius_km` are returned, nearest first.",
    params(ListDisastersQuery, PaginationParams),
    responses(
        (status = 200, description = "Paginated disaster list", body = DisasterListResponse),
        (status = 400, description = "Invalid proximity query", body = ErrorResponse),
    )
)]
pub async fn list_disasters(
    State(state): State<AppState>,
    Caller(_user): Caller,
    Query(query): Query<ListDisastersQuery>,
    Query(page): Query<PaginationParams>,
) -> Result<impl IntoResponse, HubError> {
    let filter = build_filter(&query, state.default_radius_km)?;
    let listings = state.disaster_service.list(&filter).await?;
    let (data, pagination) = page.paginate(listings);
    Ok(Json(DisasterListResponse { data, pagination }))
}

/// `GET /disasters/{id}` — Get one disaster.
///
/// # Errors
///
/// Returns [`HubError::NotFound`] if the disaster does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/disasters/{id}",
    tag = "Disasters",
    summary = "Get a disaster",
    params(
        ("id" = uuid::Uuid, Path, description = "Disaster UUID"),
    ),
    responses(
        (status = 200, description = "Disaster", body = Disaster),
        (status = 404, description = "Disaster not found", body = ErrorResponse),
    )
)]
pub async fn get_disaster(
    State(state): State<AppState>,
    Caller(_user): Caller,
    DisasterPath(id): DisasterPath,
) -> Result<impl IntoResponse, HubError> {
    Ok(Json(state.disaster_service.get(id).await?))
}

/// `PUT /disasters/{id}` — Update a disaster.
///
/// # Errors
///
/// Returns [`HubError::NotFound`], [`HubError::Forbidden`] or a validation
/// error.
#[utoipa::path(
    put,
    path = "/api/v1/disasters/{id}",
    tag = "Disasters",
    summary = "Update a disaster",
    description = "Applies the fields present in the body. Only the owner or an admin may update. A changed `location_name` is geocoded again.",
    params(
        ("id" = uuid::Uuid, Path, description = "Disaster UUID"),
    ),
    request_body = DisasterPatch,
    responses(
        (status = 200, description = "Updated disaster", body = Disaster),
        (status = 400, description = "Empty or invalid patch", body = ErrorResponse),
        (status = 403, description = "Caller is neither owner nor admin", body = ErrorResponse),
        (status = 404, description = "Disaster not found", body = ErrorResponse),
    )
)]
pub async fn update_disaster(
    State(state): State<AppState>,
    Caller(user): Caller,
    DisasterPath(id): DisasterPath,
    Json(patch): Json<DisasterPatch>,
) -> Result<impl IntoResponse, HubError> {
    Ok(Json(state.disaster_service.update(id, patch, &user).await?))
}

/// `DELETE /disasters/{id}` — Delete a disaster.
///
/// # Errors
///
/// Returns [`HubError::NotFound`] or [`HubError::Forbidden`].
#[utoipa::path(
    delete,
    path = "/api/v1/disasters/{id}",
    tag = "Disasters",
    summary = "Delete a disaster",
    description = "Removes the disaster and returns its final snapshot, whose audit trail ends with the delete entry.",
    params(
        ("id" = uuid::Uuid, Path, description = "Disaster UUID"),
    ),
    responses(
        (status = 200, description = "Deleted snapshot", body = DeleteDisasterResponse),
        (status = 403, description = "Caller is neither owner nor admin", body = ErrorResponse),
        (status = 404, description = "Disaster not found", body = ErrorResponse),
    )
)]
pub async fn delete_disaster(
    State(state): State<AppState>,
    Caller(user): Caller,
    DisasterPath(id): DisasterPath,
) -> Result<impl IntoResponse, HubError> {
    let deleted = state.disaster_service.delete(id, &user).await?;
    Ok(Json(DeleteDisasterResponse {
        message: "Disaster deleted successfully".to_string(),
        deleted,
    }))
}

/// `GET /disasters/{id}/audit` — Audit trail of a disaster.
///
/// # Errors
///
/// Returns [`HubError::NotFound`] if the disaster does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/disasters/{id}/audit",
    tag = "Disasters",
    summary = "Get the audit trail",
    params(
        ("id" = uuid::Uuid, Path, description = "Disaster UUID"),
    ),
    responses(
        (status = 200, description = "Audit entries, oldest first", body = Vec<AuditEntry>),
        (status = 404, description = "Disaster not found", body = ErrorResponse),
    )
)]
pub async fn get_audit_trail(
    State(state): State<AppState>,
    Caller(_user): Caller,
    DisasterPath(id): DisasterPath,
) -> Result<impl IntoResponse, HubError> {
    Ok(Json(state.disaster_service.audit_trail(id).await?))
}

/// Disaster routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/disasters", get(list_disasters).post(create_disaster))
        .route(
            "/disasters/{id}",
            get(get_disaster).put(update_disaster).delete(delete_disaster),
        )
        .route("/disasters/{id}/audit", get(get_audit_trail))
}

fn build_filter(query: &ListDisastersQuery, default_radius_km: f64) -> Result<DisasterFilter, HubError> {
    let tag = query
        .tag
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let near = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => {
            let center = Coordinates::new(lat, lng);
            if !center.is_valid() {
                return Err(HubError::Validation(format!(
                    "coordinates out of range: {lat}, {lng}"
                )));
            }
            let radius_km = query.radius_km.unwrap_or(default_radius_km);
            if !radius_km.is_finite() || radius_km <= 0.0 {
                return Err(HubError::Validation("radius_km must be positive".to_string()));
            }
            Some(NearFilter { center, radius_km })
        }
        (None, None) => None,
        _ => {
            return Err(HubError::Validation(
                "lat and lng must be supplied together".to_string(),
            ));
        }
    };

    Ok(DisasterFilter { tag, near })
}
