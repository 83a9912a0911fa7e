//! Location resolution: free text → place name → coordinates.
//!
//! Two independently pluggable steps run in a fixed order:
//!
//! 1. [`LocationExtractor`] pulls a place name out of free text.
//! 2. [`Geocoder`] maps a place name to [`Coordinates`].
//!
//! [`LocationResolver`] composes them and absorbs every [`ProviderError`]:
//! an extraction failure becomes the "unknown" sentinel and a geocoding
//! failure becomes `success = false`. Nothing in this module fails the
//! operation that called it.

pub mod geo;
pub mod nominatim;
pub mod providers;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

pub use geo::{Coordinates, EARTH_RADIUS_KM, KM_TO_MILES, distance_km};
pub use nominatim::NominatimGeocoder;
pub use providers::{ChainGeocoder, GazetteerExtractor, GazetteerGeocoder};

use crate::error::HubError;

/// Place name reported when extraction finds nothing usable.
pub const UNKNOWN_PLACE: &str = "Unknown location";

/// Maximum number of places accepted by [`LocationResolver::batch_geocode`].
pub const MAX_BATCH_SIZE: usize = 10;

/// Failure reported by an extraction or geocoding provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider could not be reached or returned a transport error.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    /// The provider answered with something that could not be parsed.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
    /// The provider has no result for the query.
    #[error("no result for `{0}`")]
    NotFound(String),
}

/// How a place name was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Matched a known place name.
    Gazetteer,
    /// Matched a "near/in/at <Place>" phrase.
    Pattern,
    /// Returned by an external extraction service.
    External,
    /// Nothing usable was found.
    Fallback,
}

/// Result of the extraction step.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ExtractedPlace {
    /// Extracted place name, or [`UNKNOWN_PLACE`].
    pub place_name: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Extraction method.
    pub method: ExtractionMethod,
}

impl ExtractedPlace {
    /// The "unknown" sentinel.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            place_name: UNKNOWN_PLACE.to_string(),
            confidence: 0.0,
            method: ExtractionMethod::Fallback,
        }
    }

    /// Returns `true` if this is the sentinel rather than a real place.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.method == ExtractionMethod::Fallback
            || self.place_name.trim().is_empty()
            || self.place_name == UNKNOWN_PLACE
    }
}

/// A successful geocoding answer from one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeHit {
    /// Resolved position.
    pub coordinates: Coordinates,
    /// Provider's canonical name for the place.
    pub formatted_name: String,
    /// Name of the provider that answered.
    pub provider: String,
}

/// Soft result of the geocoding step.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GeocodeOutcome {
    /// Whether coordinates were found.
    pub success: bool,
    /// Resolved position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    /// Canonical place name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_name: Option<String>,
    /// Provider that answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Failure description when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GeocodeOutcome {
    /// Builds a failed outcome.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            coordinates: None,
            formatted_name: None,
            provider: None,
            error: Some(reason.into()),
        }
    }
}

impl From<GeocodeHit> for GeocodeOutcome {
    fn from(hit: GeocodeHit) -> Self {
        Self {
            success: true,
            coordinates: Some(hit.coordinates),
            formatted_name: Some(hit.formatted_name),
            provider: Some(hit.provider),
            error: None,
        }
    }
}

/// Extract-then-geocode result for one piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProcessOutcome {
    /// Extraction result (possibly the unknown sentinel).
    pub location: ExtractedPlace,
    /// Geocoding result; absent when extraction found nothing.
    pub geocoding: Option<GeocodeOutcome>,
    /// `true` when coordinates were obtained.
    pub success: bool,
}

/// Per-item result of [`LocationResolver::batch_geocode`].
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BatchItem {
    /// Requested place.
    pub location: String,
    /// Geocoding result.
    pub result: GeocodeOutcome,
}

/// Location resolved for an aggregate mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Final place name (explicit or extracted).
    pub location_name: Option<String>,
    /// Coordinates, when geocoding succeeded.
    pub coordinates: Option<Coordinates>,
    /// `true` iff the caller supplied no name and extraction produced one.
    pub extracted: bool,
    /// Geocoding outcome, absent when there was no name to geocode.
    pub geocoding: Option<GeocodeOutcome>,
}

/// Extracts a place name from free text.
#[async_trait]
pub trait LocationExtractor: Debug + Send + Sync {
    /// Best-effort extraction.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] if the provider fails; callers treat
    /// this as a soft failure.
    async fn extract(&self, text: &str) -> Result<ExtractedPlace, ProviderError>;
}

/// Maps place names to coordinates and back.
#[async_trait]
pub trait Geocoder: Debug + Send + Sync {
    /// Short provider name used in outcomes and logs.
    fn name(&self) -> &str;

    /// Resolves a place name.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] if the place is unknown or the provider
    /// fails.
    async fn geocode(&self, place: &str) -> Result<GeocodeHit, ProviderError>;

    /// Describes the place at `coordinates`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] if nothing is known about the position
    /// or the provider fails.
    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<String, ProviderError>;
}

/// Composes an extractor and a geocoder into the fallback chain
/// explicit name → extraction → geocoding.
#[derive(Debug, Clone)]
pub struct LocationResolver {
    extractor: Arc<dyn LocationExtractor>,
    geocoder: Arc<dyn Geocoder>,
    min_confidence: f64,
}

impl LocationResolver {
    /// Creates a resolver. Extractions below `min_confidence` count as
    /// unknown.
    #[must_use]
    pub fn new(
        extractor: Arc<dyn LocationExtractor>,
        geocoder: Arc<dyn Geocoder>,
        min_confidence: f64,
    ) -> Self {
        Self {
            extractor,
            geocoder,
            min_confidence,
        }
    }

    /// Gazetteer-backed resolver with no network providers.
    #[must_use]
    pub fn offline() -> Self {
        Self::new(
            Arc::new(GazetteerExtractor::new()),
            Arc::new(GazetteerGeocoder::new()),
            0.5,
        )
    }

    /// Extraction step. Never fails: provider errors and low-confidence
    /// answers yield [`ExtractedPlace::unknown`].
    pub async fn extract_place(&self, text: &str) -> ExtractedPlace {
        match self.extractor.extract(text).await {
            Ok(place) if place.is_unknown() => place,
            Ok(place) if place.confidence < self.min_confidence => {
                tracing::debug!(
                    place = %place.place_name,
                    confidence = place.confidence,
                    "extraction below confidence threshold"
                );
                ExtractedPlace::unknown()
            }
            Ok(place) => {
                tracing::info!(
                    place = %place.place_name,
                    confidence = place.confidence,
                    "location extracted from text"
                );
                place
            }
            Err(e) => {
                tracing::warn!(error = %e, "location extraction failed");
                ExtractedPlace::unknown()
            }
        }
    }

    /// Geocoding step. Never fails: provider errors yield
    /// `success = false`.
    pub async fn geocode(&self, place: &str) -> GeocodeOutcome {
        let place = place.trim();
        if place.is_empty() {
            return GeocodeOutcome::failed("empty place name");
        }
        match self.geocoder.geocode(place).await {
            Ok(hit) => {
                tracing::info!(
                    place,
                    lat = hit.coordinates.lat,
                    lng = hit.coordinates.lng,
                    provider = %hit.provider,
                    "location geocoded"
                );
                hit.into()
            }
            Err(e) => {
                tracing::warn!(place, error = %e, "geocoding failed");
                GeocodeOutcome::failed(e.to_string())
            }
        }
    }

    /// Reverse geocoding. Falls back to the formatted coordinate pair.
    pub async fn reverse_geocode(&self, coordinates: Coordinates) -> String {
        match self.geocoder.reverse_geocode(coordinates).await {
            Ok(address) => address,
            Err(e) => {
                tracing::warn!(
                    lat = coordinates.lat,
                    lng = coordinates.lng,
                    error = %e,
                    "reverse geocoding failed"
                );
                format!("{:.4}, {:.4}", coordinates.lat, coordinates.lng)
            }
        }
    }

    /// Extracts then geocodes. Unknown extraction skips geocoding.
    pub async fn process(&self, text: &str) -> ProcessOutcome {
        let location = self.extract_place(text).await;
        if location.is_unknown() {
            return ProcessOutcome {
                location,
                geocoding: None,
                success: false,
            };
        }
        let geocoding = self.geocode(&location.place_name).await;
        ProcessOutcome {
            success: geocoding.success,
            location,
            geocoding: Some(geocoding),
        }
    }

    /// Geocodes up to [`MAX_BATCH_SIZE`] places.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if `places` is empty or too long.
    pub async fn batch_geocode(&self, places: &[String]) -> Result<Vec<BatchItem>, HubError> {
        if places.is_empty() {
            return Err(HubError::Validation("locations array is required".to_string()));
        }
        if places.len() > MAX_BATCH_SIZE {
            return Err(HubError::Validation(format!(
                "maximum {MAX_BATCH_SIZE} locations allowed per batch"
            )));
        }
        let mut items = Vec::with_capacity(places.len());
        for place in places {
            items.push(BatchItem {
                location: place.clone(),
                result: self.geocode(place).await,
            });
        }
        Ok(items)
    }

    /// Runs the fallback chain for an aggregate: an explicit name wins,
    /// otherwise the name is extracted from `text`; whatever name results
    /// is geocoded.
    pub async fn resolve(&self, explicit: Option<&str>, text: &str) -> Resolution {
        let explicit = explicit.map(str::trim).filter(|s| !s.is_empty());

        let (location_name, extracted) = match explicit {
            Some(name) => (Some(name.to_string()), false),
            None => {
                let place = self.extract_place(text).await;
                if place.is_unknown() {
                    (None, false)
                } else {
                    (Some(place.place_name), true)
                }
            }
        };

        let geocoding = match location_name.as_deref() {
            Some(name) => Some(self.geocode(name).await),
            None => None,
        };
        let coordinates = geocoding.as_ref().and_then(|g| g.coordinates);

        Resolution {
            location_name,
            coordinates,
            extracted,
            geocoding,
        }
    }

    /// Haversine distance in kilometres.
    #[must_use]
    pub fn distance(&self, lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
        distance_km(lat1, lng1, lat2, lng2)
    }
}
