//! Facade over rooms, fan-out and monitoring sessions.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use super::{Broadcaster, SubscriberId, Subscription};
use crate::domain::{DisasterId, EventSink, EventType, HubEvent};
use crate::monitoring::{ActivityCounters, MonitoringRegistry, MonitoringSession, MonitoringStatus};

/// What [`EventHub::on_disconnect`] cleaned up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DisconnectSummary {
    /// Rooms the subscriber was removed from.
    pub rooms_left: Vec<DisasterId>,
    /// Disasters whose monitoring session was stopped.
    pub sessions_stopped: Vec<DisasterId>,
}

/// The Event Hub: rooms keyed by disaster, global broadcast, and the
/// monitoring sessions whose ticks flow into those rooms.
///
/// Every event passing through [`EventSink::emit`] on the hub also feeds the
/// activity counters reported by the disaster's next monitoring tick.
#[derive(Debug, Clone)]
pub struct EventHub {
    broadcaster: Broadcaster,
    sessions: MonitoringRegistry,
}

impl EventHub {
    /// Creates a hub with per-subscriber queues of `buffer` events and
    /// monitoring ticks every `monitoring_interval`.
    #[must_use]
    pub fn new(buffer: usize, monitoring_interval: Duration) -> Self {
        let broadcaster = Broadcaster::new(buffer);
        let sink: Arc<dyn EventSink> = Arc::new(broadcaster.clone());
        Self {
            sessions: MonitoringRegistry::new(sink, monitoring_interval),
            broadcaster,
        }
    }

    /// Underlying broadcaster.
    #[must_use]
    pub const fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Underlying monitoring registry.
    #[must_use]
    pub const fn sessions(&self) -> &MonitoringRegistry {
        &self.sessions
    }

    /// Registers a new subscriber.
    pub async fn connect(&self) -> Subscription {
        self.broadcaster.connect().await
    }

    /// Adds `subscriber` to the room for `disaster_id`.
    pub async fn join(&self, subscriber: SubscriberId, disaster_id: DisasterId) -> bool {
        self.broadcaster.join(subscriber, disaster_id).await
    }

    /// Removes `subscriber` from the room for `disaster_id`.
    pub async fn leave(&self, subscriber: SubscriberId, disaster_id: DisasterId) -> bool {
        self.broadcaster.leave(subscriber, disaster_id).await
    }

    /// Publishes `payload` as `event_type` to the room for `disaster_id`.
    pub async fn publish_to_room(
        &self,
        disaster_id: DisasterId,
        event_type: EventType,
        payload: serde_json::Value,
    ) -> usize {
        let event = HubEvent::for_disaster(event_type, disaster_id, payload);
        self.record(&event).await;
        self.broadcaster.publish_to_room(disaster_id, &event).await
    }

    /// Publishes an urgent alert to every connected subscriber.
    pub async fn publish_global(
        &self,
        disaster_id: Option<DisasterId>,
        payload: serde_json::Value,
    ) -> usize {
        let event = HubEvent::urgent_alert(disaster_id, payload);
        self.record(&event).await;
        self.broadcaster.publish_global(&event).await
    }

    /// Starts a monitoring session owned by `subscriber`.
    pub async fn start_monitoring<I, S>(
        &self,
        disaster_id: DisasterId,
        keywords: I,
        subscriber: SubscriberId,
    ) -> MonitoringStatus
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sessions.start(disaster_id, keywords, subscriber).await
    }

    /// Stops the monitoring session for `disaster_id`.
    pub async fn stop_monitoring(&self, disaster_id: DisasterId) -> MonitoringStatus {
        self.sessions.stop(disaster_id).await
    }

    /// Running monitoring sessions.
    pub async fn active_sessions(&self) -> Vec<MonitoringSession> {
        self.sessions.active_sessions().await
    }

    /// Cleans up after a subscriber goes away: leaves every room, then stops
    /// every monitoring session it started.
    pub async fn on_disconnect(&self, subscriber: SubscriberId) -> DisconnectSummary {
        let rooms_left = self.broadcaster.disconnect(subscriber).await;
        let sessions_stopped = self.sessions.stop_owned_by(subscriber).await;
        tracing::info!(
            %subscriber,
            rooms = rooms_left.len(),
            sessions = sessions_stopped.len(),
            "subscriber cleaned up"
        );
        DisconnectSummary {
            rooms_left,
            sessions_stopped,
        }
    }

    /// Stops every monitoring session.
    pub async fn shutdown(&self) -> usize {
        self.sessions.stop_all().await
    }

    async fn record(&self, event: &HubEvent) {
        let Some(disaster_id) = event.disaster_id else {
            return;
        };
        let activity = match event.event_type {
            EventType::ReportsUpdated => ActivityCounters {
                new_reports: item_count(&event.payload, "reports"),
                ..ActivityCounters::default()
            },
            EventType::ResourcesUpdated => ActivityCounters {
                resources_updated: item_count(&event.payload, "resources"),
                ..ActivityCounters::default()
            },
            EventType::UrgentAlert => ActivityCounters {
                urgent_alerts: 1,
                ..ActivityCounters::default()
            },
            _ => return,
        };
        self.sessions.record_activity(disaster_id, activity).await;
    }
}

/// Number of items under `key` when it is an array, otherwise one.
fn item_count(payload: &serde_json::Value, key: &str) -> u64 {
    payload
        .get(key)
        .and_then(serde_json::Value::as_array)
        .map_or(1, |items| items.len() as u64)
}

#[async_trait]
impl EventSink for EventHub {
    async fn emit(&self, event: HubEvent) -> usize {
        self.record(&event).await;
        self.broadcaster.emit(event).await
    }
}
