//! OpenStreetMap Nominatim geocoder over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{Coordinates, GeocodeHit, Geocoder, ProviderError};

const USER_AGENT: &str = concat!("disaster-hub/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResult {
    display_name: Option<String>,
    error: Option<String>,
}

/// Geocoder backed by a Nominatim-compatible endpoint.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// Creates a geocoder for `base_url` (e.g.
    /// `https://nominatim.openstreetmap.org`).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Unavailable`] if the HTTP client cannot be
    /// built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<reqwest::Url, ProviderError> {
        reqwest::Url::parse_with_params(&format!("{}/{path}", self.base_url), params)
            .map_err(|e| ProviderError::Unavailable(format!("bad nominatim url: {e}")))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: reqwest::Url,
    ) -> Result<T, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ProviderError::Unavailable(format!(
                "nominatim returned {}",
                response.status()
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    fn name(&self) -> &str {
        "nominatim"
    }

    async fn geocode(&self, place: &str) -> Result<GeocodeHit, ProviderError> {
        let url = self.url(
            "search",
            &[("q", place), ("format", "json"), ("limit", "1")],
        )?;
        let results: Vec<SearchResult> = self.get_json(url).await?;
        let first = results
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NotFound(place.to_string()))?;
        parse_hit(first, self.name())
    }

    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<String, ProviderError> {
        let lat = coordinates.lat.to_string();
        let lon = coordinates.lng.to_string();
        let url = self.url(
            "reverse",
            &[("lat", lat.as_str()), ("lon", lon.as_str()), ("format", "json")],
        )?;
        let result: ReverseResult = self.get_json(url).await?;
        match (result.display_name, result.error) {
            (Some(name), _) => Ok(name),
            (None, Some(err)) => Err(ProviderError::NotFound(err)),
            (None, None) => Err(ProviderError::InvalidResponse(
                "missing display_name".to_string(),
            )),
        }
    }
}

fn parse_hit(result: SearchResult, provider: &str) -> Result<GeocodeHit, ProviderError> {
    let lat: f64 = result
        .lat
        .parse()
        .map_err(|_| ProviderError::InvalidResponse(format!("bad latitude `{}`", result.lat)))?;
    let lng: f64 = result
        .lon
        .parse()
        .map_err(|_| ProviderError::InvalidResponse(format!("bad longitude `{}`", result.lon)))?;
    let coordinates = Coordinates::new(lat, lng);
    if !coordinates.is_valid() {
        return Err(ProviderError::InvalidResponse(format!(
            "coordinates out of range: {lat}, {lng}"
        )));
    }
    Ok(GeocodeHit {
        coordinates,
        formatted_name: result.display_name,
        provider: provider.to_string(),
    })
}
