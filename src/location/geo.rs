//! Geographic primitives: coordinates and great-circle distance.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Mean Earth radius used by the Haversine formula, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres to statute miles.
pub const KM_TO_MILES: f64 = 0.621_371;

/// A WGS-84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lng: f64,
}

impl Coordinates {
    /// Creates a coordinate pair.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns `true` when both components are finite and inside the
    /// valid latitude/longitude ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance to `other` in kilometres.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        distance_km(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Spherical Haversine distance between two points, in kilometres.
///
/// `a = sin²(Δlat/2) + cos(lat1)·cos(lat2)·sin²(Δlng/2)`,
/// `d = 2·R·atan2(√a, √(1-a))` with `R = 6371 km`.
#[must_use]
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let half_lat = (d_lat / 2.0).sin();
    let half_lng = (d_lng / 2.0).sin();
    // Rounding can push `a` just outside [0, 1] near antipodes.
    let a = (half_lat * half_lat
        + lat1.to_radians().cos() * lat2.to_radians().cos() * half_lng * half_lng)
        .clamp(0.0, 1.0);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        for (lat, lng) in [(0.0, 0.0), (40.7128, -74.006), (-33.86, 151.21), (89.9, 179.9)] {
            assert!(distance_km(lat, lng, lat, lng).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let ab = distance_km(40.7589, -73.9851, 40.6997, -73.9939);
        let ba = distance_km(40.6997, -73.9939, 40.7589, -73.9851);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn manhattan_to_brooklyn_heights_is_a_few_km() {
        let d = distance_km(40.7589, -73.9851, 40.6997, -73.9939);
        assert!(d > 6.0 && d < 7.0, "unexpected distance {d}");
    }

    #[test]
    fn quarter_meridian_matches_radius() {
        let d = distance_km(0.0, 0.0, 90.0, 0.0);
        let expected = EARTH_RADIUS_KM * std::f64::consts::FRAC_PI_2;
        assert!((d - expected).abs() < 1e-6);
    }

    #[test]
    fn antipodal_points_give_half_circumference() {
        let half = EARTH_RADIUS_KM * std::f64::consts::PI;
        for (lat1, lng1, lat2, lng2) in [
            (0.0, 0.0, 0.0, 180.0),
            (40.7128, -74.006, -40.7128, 105.994),
            (-33.86, 151.21, 33.86, -28.79),
            (90.0, 0.0, -90.0, 0.0),
        ] {
            let d = distance_km(lat1, lng1, lat2, lng2);
            assert!(d.is_finite(), "NaN for ({lat1}, {lng1}) -> ({lat2}, {lng2})");
            assert!((d - half).abs() < 0.01, "unexpected distance {d}");
        }
    }

    #[test]
    fn validity_checks_ranges() {
        assert!(Coordinates::new(40.0, -74.0).is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, f64::NAN).is_valid());
    }
}
