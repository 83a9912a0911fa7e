//! Monitoring session state exposed to callers.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::DisasterId;
use crate::hub::SubscriberId;

/// Result of a start/stop request. Never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MonitoringStatus {
    /// A new session was started.
    Started,
    /// A session for this disaster was already running; nothing changed.
    AlreadyActive,
    /// The session was stopped.
    Stopped,
    /// There was no session to stop.
    NotActive,
}

impl MonitoringStatus {
    /// Human-readable status message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Started => "Real-time monitoring started",
            Self::AlreadyActive => "Monitoring already active for this disaster",
            Self::Stopped => "Real-time monitoring stopped",
            Self::NotActive => "No active monitoring for this disaster",
        }
    }
}

/// One monitoring session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MonitoringSession {
    /// Watched disaster.
    pub disaster_id: DisasterId,
    /// Keywords supplied at start, echoed in every tick.
    pub keywords: BTreeSet<String>,
    /// Subscriber that started (and owns) the session.
    pub subscriber: SubscriberId,
    /// Start time.
    pub started_at: DateTime<Utc>,
    /// `true` while the periodic task runs.
    pub active: bool,
}

/// Field activity observed for a disaster since the previous tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ActivityCounters {
    /// Field/social reports pushed to the room.
    pub new_reports: u64,
    /// Urgent alerts raised for the disaster.
    pub urgent_alerts: u64,
    /// Resource changes pushed to the room.
    pub resources_updated: u64,
}

impl ActivityCounters {
    /// Returns the current counts and resets them to zero.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Adds `other` to these counts.
    pub fn add(&mut self, other: Self) {
        self.new_reports = self.new_reports.saturating_add(other.new_reports);
        self.urgent_alerts = self.urgent_alerts.saturating_add(other.urgent_alerts);
        self.resources_updated = self.resources_updated.saturating_add(other.resources_updated);
    }
}
