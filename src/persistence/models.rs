//! Database row model for the `disasters` table.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::{AuditTrail, Disaster, DisasterId};
use crate::location::Coordinates;
use crate::persistence::StorageError;

/// One row of the `disasters` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DisasterRow {
    /// Primary key.
    pub id: Uuid,
    /// Headline.
    pub title: String,
    /// Description.
    pub description: String,
    /// Place name.
    pub location_name: Option<String>,
    /// Latitude, set together with `longitude`.
    pub latitude: Option<f64>,
    /// Longitude, set together with `latitude`.
    pub longitude: Option<f64>,
    /// Tag array.
    pub tags: Vec<String>,
    /// Owner user id.
    pub owner_id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
    /// Audit trail as JSONB.
    pub audit_trail: Json<AuditTrail>,
}

impl TryFrom<DisasterRow> for Disaster {
    type Error = StorageError;

    /// Rejects rows that break aggregate invariants: half-set or
    /// out-of-range coordinates, or an empty audit trail.
    fn try_from(row: DisasterRow) -> Result<Self, Self::Error> {
        let resolved_coordinates = match (row.latitude, row.longitude) {
            (Some(lat), Some(lng)) => {
                let coordinates = Coordinates::new(lat, lng);
                if !coordinates.is_valid() {
                    return Err(StorageError::Corrupt(format!(
                        "disaster {} has out-of-range coordinates {lat}, {lng}",
                        row.id
                    )));
                }
                Some(coordinates)
            }
            (None, None) => None,
            _ => {
                return Err(StorageError::Corrupt(format!(
                    "disaster {} has only one of latitude/longitude",
                    row.id
                )));
            }
        };
        if row.audit_trail.0.is_empty() {
            return Err(StorageError::Corrupt(format!(
                "disaster {} has an empty audit trail",
                row.id
            )));
        }
        Ok(Self {
            id: DisasterId::from_uuid(row.id),
            title: row.title,
            description: row.description,
            location_name: row.location_name,
            resolved_coordinates,
            tags: row.tags.into_iter().collect(),
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            audit_trail: row.audit_trail.0,
        })
    }
}

impl From<&Disaster> for DisasterRow {
    fn from(d: &Disaster) -> Self {
        Self {
            id: *d.id.as_uuid(),
            title: d.title.clone(),
            description: d.description.clone(),
            location_name: d.location_name.clone(),
            latitude: d.resolved_coordinates.map(|c| c.lat),
            longitude: d.resolved_coordinates.map(|c| c.lng),
            tags: d.tags.iter().cloned().collect(),
            owner_id: d.owner_id.clone(),
            created_at: d.created_at,
            updated_at: d.updated_at,
            audit_trail: Json(d.audit_trail.clone()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::disaster::normalize_tags;
    use crate::domain::{AuditAction, AuditEntry};

    fn created_trail() -> AuditTrail {
        let mut trail = AuditTrail::new();
        trail.append(AuditEntry::new(AuditAction::Create, "citizen1", BTreeMap::new()));
        trail
    }

    fn row(latitude: Option<f64>, longitude: Option<f64>, audit_trail: AuditTrail) -> DisasterRow {
        DisasterRow {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            description: "d".to_string(),
            location_name: None,
            latitude,
            longitude,
            tags: vec![],
            owner_id: "o".to_string(),
            created_at: Utc::now(),
            updated_at: None,
            audit_trail: Json(audit_trail),
        }
    }

    #[test]
    fn row_round_trip_keeps_coordinates_and_tags() {
        let disaster = Disaster {
            id: DisasterId::new(),
            title: "Flood".to_string(),
            description: "Water rising".to_string(),
            location_name: Some("Queens, New York".to_string()),
            resolved_coordinates: Some(Coordinates::new(40.7282, -73.7949)),
            tags: normalize_tags(["flood", "urgent"]),
            owner_id: "citizen1".to_string(),
            created_at: Utc::now(),
            updated_at: None,
            audit_trail: created_trail(),
        };
        let row = DisasterRow::from(&disaster);
        assert_eq!(row.latitude, Some(40.7282));
        let Ok(decoded) = Disaster::try_from(row) else {
            panic!("row should decode");
        };
        assert_eq!(decoded, disaster);
    }

    #[test]
    fn row_without_coordinates_decodes() {
        let Ok(decoded) = Disaster::try_from(row(None, None, created_trail())) else {
            panic!("row should decode");
        };
        assert!(decoded.resolved_coordinates.is_none());
    }

    #[test]
    fn malformed_rows_are_corrupt() {
        for bad in [
            row(Some(1.0), None, created_trail()),
            row(None, Some(1.0), created_trail()),
            row(Some(95.0), Some(0.0), created_trail()),
            row(None, None, AuditTrail::new()),
        ] {
            assert!(matches!(Disaster::try_from(bad), Err(StorageError::Corrupt(_))));
        }
    }
}
