//! Deterministic, in-process location providers and the geocoder chain.
//!
//! The gazetteer is a small static table of known places. It backs both a
//! keyword extractor and a lookup geocoder so the service resolves common
//! locations without any network provider.

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    Coordinates, ExtractedPlace, ExtractionMethod, GeocodeHit, Geocoder, LocationExtractor,
    ProviderError,
};

/// Confidence assigned to a gazetteer match.
const GAZETTEER_CONFIDENCE: f64 = 0.95;

/// Confidence assigned to a "near <Place>" phrase match.
const PATTERN_CONFIDENCE: f64 = 0.8;

/// Reverse lookups farther than this from every known place fail.
const REVERSE_MAX_KM: f64 = 15.0;

/// Words that introduce a place phrase.
const PLACE_PREPOSITIONS: &[&str] = &["near", "in", "at", "around", "outside"];

/// One known place: canonical name, lowercase aliases, position.
#[derive(Debug, Clone, Copy)]
struct Place {
    name: &'static str,
    aliases: &'static [&'static str],
    lat: f64,
    lng: f64,
}

const GAZETTEER: &[Place] = &[
    Place {
        name: "Downtown Manhattan, NYC",
        aliases: &["downtown manhattan", "manhattan"],
        lat: 40.7589,
        lng: -73.9851,
    },
    Place {
        name: "Brooklyn Heights, Brooklyn",
        aliases: &["brooklyn heights", "brooklyn"],
        lat: 40.6997,
        lng: -73.9939,
    },
    Place {
        name: "Queens, New York",
        aliases: &["queens"],
        lat: 40.7282,
        lng: -73.7949,
    },
    Place {
        name: "Bronx, New York",
        aliases: &["the bronx", "bronx"],
        lat: 40.8448,
        lng: -73.8648,
    },
    Place {
        name: "Staten Island, New York",
        aliases: &["staten island"],
        lat: 40.5795,
        lng: -74.1502,
    },
    Place {
        name: "New York City",
        aliases: &["new york city", "new york", "nyc"],
        lat: 40.7128,
        lng: -74.0060,
    },
    Place {
        name: "New Orleans, Louisiana",
        aliases: &["new orleans"],
        lat: 29.9511,
        lng: -90.0715,
    },
    Place {
        name: "Houston, Texas",
        aliases: &["houston"],
        lat: 29.7604,
        lng: -95.3698,
    },
    Place {
        name: "Miami, Florida",
        aliases: &["miami"],
        lat: 25.7617,
        lng: -80.1918,
    },
    Place {
        name: "Los Angeles, California",
        aliases: &["los angeles"],
        lat: 34.0522,
        lng: -118.2437,
    },
    Place {
        name: "San Francisco, California",
        aliases: &["san francisco"],
        lat: 37.7749,
        lng: -122.4194,
    },
];

fn normalize(s: &str) -> String {
    s.trim()
        .trim_end_matches(['.', ',', ';', ':', '!', '?'])
        .to_lowercase()
}

fn lookup(place: &str) -> Option<&'static Place> {
    let key = normalize(place);
    GAZETTEER
        .iter()
        .find(|p| normalize(p.name) == key || p.aliases.contains(&key.as_str()))
}

/// Finds the longest gazetteer alias occurring in `text` on word
/// boundaries.
fn find_known_place(text: &str) -> Option<&'static Place> {
    let haystack = format!(" {} ", tokenize(text).join(" ").to_lowercase());
    GAZETTEER
        .iter()
        .flat_map(|p| p.aliases.iter().map(move |a| (p, *a)))
        .filter(|(_, alias)| haystack.contains(&format!(" {alias} ")))
        .max_by_key(|(_, alias)| alias.len())
        .map(|(p, _)| p)
}

fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .collect()
}

fn starts_uppercase(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

/// Finds the first "<preposition> <Capitalised Words>" phrase.
fn find_place_phrase(text: &str) -> Option<String> {
    let raw: Vec<&str> = text.split_whitespace().collect();
    let mut i = 0;
    while i < raw.len() {
        let is_prep = raw
            .get(i)
            .map(|w| normalize(w))
            .is_some_and(|w| PLACE_PREPOSITIONS.contains(&w.as_str()));
        if is_prep {
            let mut words = Vec::new();
            for word in raw.iter().skip(i + 1) {
                let clean = word.trim_matches(|c: char| !c.is_alphanumeric());
                if clean.is_empty() || !starts_uppercase(clean) {
                    break;
                }
                words.push(clean);
                if word.ends_with([',', '.', ';', ':', '!', '?']) {
                    break;
                }
            }
            if !words.is_empty() {
                return Some(words.join(" "));
            }
        }
        i += 1;
    }
    None
}

/// Keyword extractor: a known place name wins, otherwise the first
/// "near/in/at <Capitalised Words>" phrase.
#[derive(Debug, Clone, Copy, Default)]
pub struct GazetteerExtractor;

impl GazetteerExtractor {
    /// Creates the extractor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LocationExtractor for GazetteerExtractor {
    async fn extract(&self, text: &str) -> Result<ExtractedPlace, ProviderError> {
        if let Some(place) = find_known_place(text) {
            return Ok(ExtractedPlace {
                place_name: place.name.to_string(),
                confidence: GAZETTEER_CONFIDENCE,
                method: ExtractionMethod::Gazetteer,
            });
        }
        Ok(find_place_phrase(text).map_or_else(ExtractedPlace::unknown, |phrase| {
            ExtractedPlace {
                place_name: phrase,
                confidence: PATTERN_CONFIDENCE,
                method: ExtractionMethod::Pattern,
            }
        }))
    }
}

/// Lookup geocoder over the static gazetteer.
#[derive(Debug, Clone, Copy, Default)]
pub struct GazetteerGeocoder;

impl GazetteerGeocoder {
    /// Creates the geocoder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Geocoder for GazetteerGeocoder {
    fn name(&self) -> &str {
        "gazetteer"
    }

    async fn geocode(&self, place: &str) -> Result<GeocodeHit, ProviderError> {
        lookup(place)
            .map(|p| GeocodeHit {
                coordinates: Coordinates::new(p.lat, p.lng),
                formatted_name: p.name.to_string(),
                provider: self.name().to_string(),
            })
            .ok_or_else(|| ProviderError::NotFound(place.to_string()))
    }

    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<String, ProviderError> {
        GAZETTEER
            .iter()
            .map(|p| (p, coordinates.distance_to(&Coordinates::new(p.lat, p.lng))))
            .filter(|(_, d)| *d <= REVERSE_MAX_KM)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(p, _)| p.name.to_string())
            .ok_or_else(|| {
                ProviderError::NotFound(format!("{}, {}", coordinates.lat, coordinates.lng))
            })
    }
}

/// Tries geocoders in priority order; the first success wins.
#[derive(Debug, Clone, Default)]
pub struct ChainGeocoder {
    providers: Vec<Arc<dyn Geocoder>>,
}

impl ChainGeocoder {
    /// Creates a chain from providers in priority order.
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn Geocoder>>) -> Self {
        Self { providers }
    }

    /// Appends a lower-priority provider.
    #[must_use]
    pub fn with(mut self, provider: Arc<dyn Geocoder>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Number of providers in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if the chain has no providers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait]
impl Geocoder for ChainGeocoder {
    fn name(&self) -> &str {
        "chain"
    }

    async fn geocode(&self, place: &str) -> Result<GeocodeHit, ProviderError> {
        let mut last_err = ProviderError::NotFound(place.to_string());
        for provider in &self.providers {
            match provider.geocode(place).await {
                Ok(hit) => return Ok(hit),
                Err(e) => {
                    tracing::debug!(provider = provider.name(), place, error = %e, "geocoder miss");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<String, ProviderError> {
        let mut last_err =
            ProviderError::NotFound(format!("{}, {}", coordinates.lat, coordinates.lng));
        for provider in &self.providers {
            match provider.reverse_geocode(coordinates).await {
                Ok(address) => return Ok(address),
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn extracts_known_place() {
        let Ok(place) = GazetteerExtractor
            .extract("Heavy flooding reported across Brooklyn Heights this morning")
            .await
        else {
            panic!("extraction should not fail");
        };
        assert_eq!(place.place_name, "Brooklyn Heights, Brooklyn");
        assert_eq!(place.method, ExtractionMethod::Gazetteer);
    }

    #[tokio::test]
    async fn prefers_longest_alias() {
        let Ok(place) = GazetteerExtractor.extract("Fire in New York City tonight").await else {
            panic!("extraction should not fail");
        };
        assert_eq!(place.place_name, "New York City");
    }

    #[tokio::test]
    async fn extracts_preposition_phrase() {
        let Ok(place) = GazetteerExtractor
            .extract("Water rising fast near Main St")
            .await
        else {
            panic!("extraction should not fail");
        };
        assert_eq!(place.place_name, "Main St");
        assert_eq!(place.method, ExtractionMethod::Pattern);
    }

    #[tokio::test]
    async fn phrase_stops_at_punctuation() {
        let Ok(place) = GazetteerExtractor
            .extract("Gas leak at Elm Street, Springfield residents told to leave")
            .await
        else {
            panic!("extraction should not fail");
        };
        assert_eq!(place.place_name, "Elm Street");
    }

    #[tokio::test]
    async fn no_place_yields_unknown() {
        let Ok(place) = GazetteerExtractor.extract("everything is on fire").await else {
            panic!("extraction should not fail");
        };
        assert!(place.is_unknown());
    }

    #[tokio::test]
    async fn geocodes_alias_case_insensitively() {
        let Ok(hit) = GazetteerGeocoder.geocode("QUEENS").await else {
            panic!("queens should geocode");
        };
        assert_eq!(hit.formatted_name, "Queens, New York");
        assert_eq!(hit.provider, "gazetteer");
    }

    #[tokio::test]
    async fn unknown_place_is_not_found() {
        assert!(matches!(
            GazetteerGeocoder.geocode("Atlantis").await,
            Err(ProviderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn reverse_finds_nearest_place() {
        let Ok(name) = GazetteerGeocoder
            .reverse_geocode(Coordinates::new(40.845, -73.865))
            .await
        else {
            panic!("reverse lookup should succeed");
        };
        assert_eq!(name, "Bronx, New York");
    }

    #[tokio::test]
    async fn reverse_far_from_everything_fails() {
        assert!(
            GazetteerGeocoder
                .reverse_geocode(Coordinates::new(-45.0, 170.0))
                .await
                .is_err()
        );
    }

    #[derive(Debug)]
    struct Down;

    #[async_trait]
    impl Geocoder for Down {
        fn name(&self) -> &str {
            "down"
        }
        async fn geocode(&self, _place: &str) -> Result<GeocodeHit, ProviderError> {
            Err(ProviderError::Unavailable("timeout".to_string()))
        }
        async fn reverse_geocode(&self, _c: Coordinates) -> Result<String, ProviderError> {
            Err(ProviderError::Unavailable("timeout".to_string()))
        }
    }

    #[tokio::test]
    async fn chain_falls_through_to_next_provider() {
        let chain = ChainGeocoder::new(vec![Arc::new(Down)]).with(Arc::new(GazetteerGeocoder));
        let Ok(hit) = chain.geocode("Miami").await else {
            panic!("second provider should answer");
        };
        assert_eq!(hit.provider, "gazetteer");
    }

    #[tokio::test]
    async fn chain_reports_last_error_when_all_fail() {
        let chain = ChainGeocoder::new(vec![Arc::new(GazetteerGeocoder), Arc::new(Down)]);
        assert!(matches!(
            chain.geocode("Atlantis").await,
            Err(ProviderError::Unavailable(_))
        ));
    }
}
