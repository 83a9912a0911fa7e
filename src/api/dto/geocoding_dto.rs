//! Location resolver DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::location::{BatchItem, Coordinates};

/// Body carrying free text to analyse.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TextRequest {
    /// Free text, e.g. a report description.
    pub text: String,
}

/// Body for `POST /geocoding/geocode`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GeocodeRequest {
    /// Place name to resolve.
    pub location: String,
}

/// Body for `POST /geocoding/reverse`.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct ReverseRequest {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// Response to `POST /geocoding/reverse`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReverseResponse {
    /// Queried position.
    pub coordinates: Coordinates,
    /// Address, or the formatted coordinate pair when unknown.
    pub address: String,
}

/// Body for `POST /geocoding/batch`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BatchRequest {
    /// Up to ten place names.
    pub locations: Vec<String>,
}

/// Response to `POST /geocoding/batch`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchResponse {
    /// One outcome per requested place, in request order.
    pub results: Vec<BatchItem>,
    /// Number of requested places.
    pub total: usize,
    /// Places that geocoded.
    pub successful: usize,
    /// Places that did not.
    pub failed: usize,
}

impl From<Vec<BatchItem>> for BatchResponse {
    fn from(results: Vec<BatchItem>) -> Self {
        let successful = results.iter().filter(|item| item.result.success).count();
        Self {
            total: results.len(),
            failed: results.len() - successful,
            successful,
            results,
        }
    }
}

/// Query for `GET /geocoding/distance`.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DistanceQuery {
    /// Latitude of the first point.
    pub lat1: f64,
    /// Longitude of the first point.
    pub lng1: f64,
    /// Latitude of the second point.
    pub lat2: f64,
    /// Longitude of the second point.
    pub lng2: f64,
}

/// Distance in several units.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct DistanceDto {
    /// Kilometres.
    pub kilometers: f64,
    /// Statute miles.
    pub miles: f64,
    /// Metres.
    pub meters: f64,
}

/// Response to `GET /geocoding/distance`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DistanceResponse {
    /// First point.
    pub from: Coordinates,
    /// Second point.
    pub to: Coordinates,
    /// Great-circle distance.
    pub distance: DistanceDto,
}
