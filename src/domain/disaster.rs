//! The disaster aggregate and its input/query shapes.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AuditTrail, DisasterId};
use crate::location::Coordinates;

/// Authoritative state of one disaster report.
///
/// Mutated only through [`crate::service::DisasterService`], which keeps
/// `audit_trail` in step with every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Disaster {
    /// Opaque, globally unique identifier.
    pub id: DisasterId,
    /// Short headline.
    pub title: String,
    /// Free-text description supplied by the reporter.
    pub description: String,
    /// Place name, explicit or extracted from the description.
    pub location_name: Option<String>,
    /// Geocoded position of `location_name`, if resolution succeeded.
    pub resolved_coordinates: Option<Coordinates>,
    /// Free-form classification tags (`"flood"`, `"urgent"`, ...).
    pub tags: BTreeSet<String>,
    /// User id of the creator.
    pub owner_id: String,
    /// Creation timestamp (immutable).
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last update, if any.
    pub updated_at: Option<DateTime<Utc>>,
    /// Every action taken on this record, oldest first.
    pub audit_trail: AuditTrail,
}

impl Disaster {
    /// Returns `true` if the disaster carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Fields accepted when creating a disaster.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NewDisaster {
    /// Headline; must be non-empty.
    pub title: String,
    /// Description; must be non-empty.
    pub description: String,
    /// Explicit place name. When absent it is extracted from `description`.
    #[serde(default)]
    pub location_name: Option<String>,
    /// Classification tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update; only `Some` fields are applied.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DisasterPatch {
    /// New headline.
    #[serde(default)]
    pub title: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New place name; triggers re-geocoding when it differs.
    #[serde(default)]
    pub location_name: Option<String>,
    /// Replacement tag set.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl DisasterPatch {
    /// Returns `true` when no field is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location_name.is_none()
            && self.tags.is_none()
    }
}

/// Proximity constraint for listing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearFilter {
    /// Search centre.
    pub center: Coordinates,
    /// Inclusive radius in kilometres.
    pub radius_km: f64,
}

/// Read filter for [`crate::persistence::DisasterStorage::select`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisasterFilter {
    /// Keep only disasters carrying this tag.
    pub tag: Option<String>,
    /// Keep only geocoded disasters within this radius.
    pub near: Option<NearFilter>,
}

/// A disaster returned by a listing, with its distance when the listing
/// was proximity-filtered.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DisasterListing {
    /// The record.
    #[serde(flatten)]
    pub disaster: Disaster,
    /// Distance from the search centre in kilometres.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// Normalises a raw tag list into a set: trimmed, empty entries dropped.
#[must_use]
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_tags_trims_and_dedups() {
        let tags = normalize_tags(["flood", " flood ", "", "urgent"]);
        assert_eq!(tags.len(), 2);
        assert!(tags.contains("flood"));
        assert!(tags.contains("urgent"));
    }

    #[test]
    fn empty_patch_detected() {
        assert!(DisasterPatch::default().is_empty());
        let patch = DisasterPatch {
            title: Some("x".to_string()),
            ..DisasterPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
