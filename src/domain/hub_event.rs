//! Events emitted by the core and delivered through the hub.
//!
//! Every aggregate mutation, monitoring tick, relayed field update and
//! urgent alert becomes a [`HubEvent`]. Events with a `disaster_id` are
//! routed to that disaster's room; [`EventType::UrgentAlert`] goes to every
//! connected subscriber.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::DisasterId;

/// Wire name of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum EventType {
    /// A disaster was created.
    #[serde(rename = "disaster.created")]
    DisasterCreated,
    /// A disaster was updated.
    #[serde(rename = "disaster.updated")]
    DisasterUpdated,
    /// A disaster was deleted.
    #[serde(rename = "disaster.deleted")]
    DisasterDeleted,
    /// Periodic monitoring summary for one disaster.
    #[serde(rename = "monitoring.tick")]
    MonitoringTick,
    /// New field or social-media reports were pushed for a disaster.
    #[serde(rename = "reports.updated")]
    ReportsUpdated,
    /// Resources for a disaster changed.
    #[serde(rename = "resources.updated")]
    ResourcesUpdated,
    /// Cross-disaster urgent alert, delivered globally.
    #[serde(rename = "urgent_alert")]
    UrgentAlert,
}

impl EventType {
    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DisasterCreated => "disaster.created",
            Self::DisasterUpdated => "disaster.updated",
            Self::DisasterDeleted => "disaster.deleted",
            Self::MonitoringTick => "monitoring.tick",
            Self::ReportsUpdated => "reports.updated",
            Self::ResourcesUpdated => "resources.updated",
            Self::UrgentAlert => "urgent_alert",
        }
    }

    /// Returns `true` for events delivered to every subscriber.
    #[must_use]
    pub const fn is_global(&self) -> bool {
        matches!(self, Self::UrgentAlert)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound event envelope: `{event_type, disaster_id?, payload, timestamp}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HubEvent {
    /// Event discriminator.
    pub event_type: EventType,
    /// Target disaster, absent for some global alerts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disaster_id: Option<DisasterId>,
    /// Event-specific body.
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    /// Emission time.
    pub timestamp: DateTime<Utc>,
}

impl HubEvent {
    /// Creates an event addressed to one disaster's room.
    #[must_use]
    pub fn for_disaster(
        event_type: EventType,
        disaster_id: DisasterId,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_type,
            disaster_id: Some(disaster_id),
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Creates an urgent alert, optionally tied to a disaster.
    #[must_use]
    pub fn urgent_alert(disaster_id: Option<DisasterId>, payload: serde_json::Value) -> Self {
        Self {
            event_type: EventType::UrgentAlert,
            disaster_id,
            payload,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_wire_names_match_serde() {
        for ty in [
            EventType::DisasterCreated,
            EventType::DisasterUpdated,
            EventType::DisasterDeleted,
            EventType::MonitoringTick,
            EventType::ReportsUpdated,
            EventType::ResourcesUpdated,
            EventType::UrgentAlert,
        ] {
            let json = serde_json::to_string(&ty).unwrap_or_default();
            assert_eq!(json, format!("\"{}\"", ty.as_str()));
        }
    }

    #[test]
    fn only_urgent_alert_is_global() {
        assert!(EventType::UrgentAlert.is_global());
        assert!(!EventType::DisasterUpdated.is_global());
        assert!(!EventType::MonitoringTick.is_global());
    }

    #[test]
    fn room_event_serializes_disaster_id() {
        let id = DisasterId::new();
        let event = HubEvent::for_disaster(
            EventType::DisasterUpdated,
            id,
            serde_json::json!({"changes": ["title"]}),
        );
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("disaster.updated"));
        assert!(json.contains(&id.to_string()));
    }

    #[test]
    fn global_alert_omits_missing_disaster_id() {
        let event = HubEvent::urgent_alert(None, serde_json::json!({"message": "evacuate"}));
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(!json.contains("disaster_id"));
        assert!(json.contains("urgent_alert"));
    }
}
