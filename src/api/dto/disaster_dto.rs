//! Disaster, alert and monitoring DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::PaginationMeta;
use crate::domain::{Disaster, DisasterId, DisasterListing};
use crate::monitoring::MonitoringSession;

/// Filters for `GET /disasters`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListDisastersQuery {
    /// Keep only disasters carrying this tag.
    pub tag: Option<String>,
    /// Latitude of the proximity centre (requires `lng`).
    pub lat: Option<f64>,
    /// Longitude of the proximity centre (requires `lat`).
    pub lng: Option<f64>,
    /// Proximity radius in kilometres.
    pub radius_km: Option<f64>,
}

/// Paginated disaster list.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DisasterListResponse {
    /// Disasters on this page.
    pub data: Vec<DisasterListing>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Response to a successful delete.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeleteDisasterResponse {
    /// Confirmation message.
    pub message: String,
    /// Final snapshot including the terminal audit entry.
    pub deleted: Disaster,
}

/// Request body for `POST /alerts`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AlertRequest {
    /// Related disaster, if any.
    #[serde(default)]
    pub disaster_id: Option<DisasterId>,
    /// Alert text.
    pub message: String,
    /// Place the alert refers to.
    #[serde(default)]
    pub location: Option<String>,
}

/// Response to `POST /alerts`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AlertResponse {
    /// Number of subscribers the alert was queued for.
    pub delivered: usize,
}

/// Response to `GET /monitoring`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MonitoringListResponse {
    /// Running sessions, oldest first.
    pub sessions: Vec<MonitoringSession>,
    /// Number of running sessions.
    pub count: usize,
}
