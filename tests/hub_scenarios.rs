//! Hub and monitoring scenarios on tokio's paused clock.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc::Receiver;

use disaster_hub::domain::{DisasterId, EventType, HubEvent};
use disaster_hub::hub::EventHub;
use disaster_hub::monitoring::MonitoringStatus;

const INTERVAL: Duration = Duration::from_secs(30);

fn drain(rx: &mut Receiver<HubEvent>) -> Vec<HubEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn ticks(events: &[HubEvent]) -> usize {
    events
        .iter()
        .filter(|e| e.event_type == EventType::MonitoringTick)
        .count()
}

#[tokio::test]
async fn two_observers_in_d1_each_get_one_copy() {
    let hub = EventHub::new(16, INTERVAL);
    let (d1, d2) = (DisasterId::new(), DisasterId::new());
    let mut first = hub.connect().await;
    let mut second = hub.connect().await;
    let mut other = hub.connect().await;
    hub.join(first.id, d1).await;
    hub.join(second.id, d1).await;
    hub.join(other.id, d2).await;

    hub.publish_to_room(d1, EventType::DisasterUpdated, json!({"title": "Flood"}))
        .await;

    assert_eq!(drain(&mut first.events).len(), 1);
    assert_eq!(drain(&mut second.events).len(), 1);
    assert!(drain(&mut other.events).is_empty());
}

#[tokio::test]
async fn joining_after_publish_receives_nothing() {
    let hub = EventHub::new(16, INTERVAL);
    let d = DisasterId::new();
    let mut early = hub.connect().await;
    hub.join(early.id, d).await;

    hub.publish_to_room(d, EventType::DisasterUpdated, json!({"n": 1})).await;
    let mut late = hub.connect().await;
    hub.join(late.id, d).await;

    assert_eq!(drain(&mut early.events).len(), 1);
    assert!(drain(&mut late.events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn ticks_stop_once_stop_returns() {
    let hub = EventHub::new(16, INTERVAL);
    let d = DisasterId::new();
    let mut watcher = hub.connect().await;
    hub.join(watcher.id, d).await;

    assert_eq!(
        hub.start_monitoring(d, ["flood"], watcher.id).await,
        MonitoringStatus::Started
    );
    assert_eq!(
        hub.start_monitoring(d, ["flood"], watcher.id).await,
        MonitoringStatus::AlreadyActive
    );

    tokio::time::sleep(INTERVAL * 2 + Duration::from_secs(1)).await;
    assert_eq!(ticks(&drain(&mut watcher.events)), 2);

    assert_eq!(hub.stop_monitoring(d).await, MonitoringStatus::Stopped);
    tokio::time::sleep(INTERVAL * 2 + Duration::from_secs(1)).await;
    assert_eq!(ticks(&drain(&mut watcher.events)), 0);
}

#[tokio::test(start_paused = true)]
async fn owner_disconnect_stops_session_for_remaining_observers() {
    let hub = EventHub::new(16, INTERVAL);
    let d1 = DisasterId::new();
    let owner = hub.connect().await;
    let mut observer = hub.connect().await;
    hub.join(observer.id, d1).await;

    hub.start_monitoring(d1, Vec::<String>::new(), owner.id).await;
    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
    assert_eq!(ticks(&drain(&mut observer.events)), 1);

    let summary = hub.on_disconnect(owner.id).await;
    assert_eq!(summary.sessions_stopped, vec![d1]);

    tokio::time::sleep(INTERVAL * 2 + Duration::from_secs(1)).await;
    assert_eq!(ticks(&drain(&mut observer.events)), 0);
    assert!(hub.active_sessions().await.is_empty());
}

#[tokio::test]
async fn urgent_alert_reaches_every_connection() {
    let hub = EventHub::new(16, INTERVAL);
    let mut in_room = hub.connect().await;
    let mut idle = hub.connect().await;
    hub.join(in_room.id, DisasterId::new()).await;

    let delivered = hub
        .publish_global(None, json!({"message": "Evacuate low-lying areas"}))
        .await;
    assert_eq!(delivered, 2);

    for events in [drain(&mut in_room.events), drain(&mut idle.events)] {
        assert_eq!(events.len(), 1);
        let Some(event) = events.first() else {
            panic!("expected the alert");
        };
        assert_eq!(event.event_type, EventType::UrgentAlert);
        assert_eq!(event.payload["message"], "Evacuate low-lying areas");
    }
}
