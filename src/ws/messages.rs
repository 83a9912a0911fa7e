//! WebSocket message types: envelope, commands, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DisasterId, HubEvent};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Response to the request with `id`.
    #[must_use]
    pub fn response(id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            msg_type: WsMessageType::Response,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Error reply to the request with `id` (empty when unparsable).
    #[must_use]
    pub fn error(id: impl Into<String>, code: u16, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            msg_type: WsMessageType::Error,
            timestamp: Utc::now(),
            payload: serde_json::json!({
                "code": code,
                "message": message.into(),
            }),
        }
    }

    /// Wraps a hub event for delivery.
    #[must_use]
    pub fn event(event: &HubEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            msg_type: WsMessageType::Event,
            timestamp: event.timestamp,
            payload: serde_json::to_value(event).unwrap_or_default(),
        }
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client hub event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands a client can send in the payload of a `command` message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Join a disaster's room.
    JoinDisaster {
        /// Room to join.
        disaster_id: DisasterId,
    },
    /// Leave a disaster's room.
    LeaveDisaster {
        /// Room to leave.
        disaster_id: DisasterId,
    },
    /// Start the monitoring session for a disaster.
    StartMonitoring {
        /// Disaster to monitor.
        disaster_id: DisasterId,
        /// Keywords echoed in every tick.
        #[serde(default)]
        keywords: Vec<String>,
    },
    /// Stop the monitoring session for a disaster.
    StopMonitoring {
        /// Disaster to stop monitoring.
        disaster_id: DisasterId,
    },
    /// Broadcast an urgent alert to every connected client.
    UrgentAlert {
        /// Related disaster, if any.
        #[serde(default)]
        disaster_id: Option<DisasterId>,
        /// Alert text.
        message: String,
        /// Optional place the alert refers to.
        #[serde(default)]
        location: Option<String>,
    },
    /// Push new field or social-media reports to a disaster's room.
    ReportUpdate {
        /// Target room.
        disaster_id: DisasterId,
        /// Report objects, relayed verbatim.
        reports: Vec<serde_json::Value>,
    },
    /// Push resource changes to a disaster's room.
    ResourceUpdate {
        /// Target room.
        disaster_id: DisasterId,
        /// Resource objects, relayed verbatim.
        resources: Vec<serde_json::Value>,
    },
}
