//! Per-disaster monitoring sessions backed by cancellable ticker tasks.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::{ActivityCounters, MonitoringSession, MonitoringStatus};
use crate::domain::{DisasterId, EventSink, EventType, HubEvent};
use crate::hub::SubscriberId;

/// A running session plus the handles needed to stop it.
#[derive(Debug)]
struct ActiveSession {
    session: MonitoringSession,
    counters: Arc<Mutex<ActivityCounters>>,
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ActiveSession {
    /// Signals the ticker and waits for it to exit. After this returns no
    /// further tick for the session can be emitted.
    async fn shutdown(self) {
        let disaster_id = self.session.disaster_id;
        let _ = self.cancel.send(true);
        if let Err(e) = self.handle.await {
            tracing::warn!(%disaster_id, error = %e, "monitoring task ended abnormally");
        }
    }
}

/// Slot for one disaster. A slot lives only while its session runs: stopping
/// retires it and unlinks it from the map.
#[derive(Debug, Default)]
struct Slot {
    active: Option<ActiveSession>,
    retired: bool,
}

/// Registry of monitoring sessions, at most one active per disaster.
///
/// Start/stop for the same disaster are serialized by that disaster's slot
/// lock; different disasters never contend beyond the brief map lookup.
/// Lock order is one slot, then the map; the map lock is never held while
/// waiting for a slot.
/// Each active session owns a tokio task that emits a
/// [`EventType::MonitoringTick`] every `interval`, first one interval after
/// start.
#[derive(Debug, Clone)]
pub struct MonitoringRegistry {
    slots: Arc<RwLock<HashMap<DisasterId, Arc<Mutex<Slot>>>>>,
    sink: Arc<dyn EventSink>,
    interval: Duration,
}

impl MonitoringRegistry {
    /// Creates an empty registry that emits ticks into `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn EventSink>, interval: Duration) -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            sink,
            interval,
        }
    }

    /// Tick period.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    async fn slot(&self, disaster_id: DisasterId) -> Arc<Mutex<Slot>> {
        if let Some(slot) = self.slots.read().await.get(&disaster_id) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().await;
        Arc::clone(slots.entry(disaster_id).or_default())
    }

    async fn existing_slot(&self, disaster_id: DisasterId) -> Option<Arc<Mutex<Slot>>> {
        self.slots.read().await.get(&disaster_id).map(Arc::clone)
    }

    /// Starts monitoring `disaster_id` on behalf of `subscriber`.
    ///
    /// Returns [`MonitoringStatus::AlreadyActive`] and changes nothing if a
    /// session is already running for the disaster.
    pub async fn start<I, S>(
        &self,
        disaster_id: DisasterId,
        keywords: I,
        subscriber: SubscriberId,
    ) -> MonitoringStatus
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut guard = loop {
            let guard = self.slot(disaster_id).await.lock_owned().await;
            // A stop retired this slot between lookup and lock.
            if !guard.retired {
                break guard;
            }
        };
        if guard.active.is_some() {
            tracing::debug!(%disaster_id, "monitoring already active");
            return MonitoringStatus::AlreadyActive;
        }

        let session = MonitoringSession {
            disaster_id,
            keywords: keywords
                .into_iter()
                .filter_map(|k| {
                    let k: String = k.into();
                    let k = k.trim();
                    (!k.is_empty()).then(|| k.to_string())
                })
                .collect(),
            subscriber,
            started_at: Utc::now(),
            active: true,
        };
        let counters = Arc::new(Mutex::new(ActivityCounters::default()));
        let (cancel, cancelled) = watch::channel(false);
        let handle = tokio::spawn(run_ticker(
            TickerContext {
                disaster_id,
                keywords: session.keywords.clone(),
                started_at: session.started_at,
                interval: self.interval,
                sink: Arc::clone(&self.sink),
                counters: Arc::clone(&counters),
            },
            cancelled,
        ));

        guard.active = Some(ActiveSession {
            session,
            counters,
            cancel,
            handle,
        });
        drop(guard);

        tracing::info!(%disaster_id, %subscriber, "monitoring started");
        MonitoringStatus::Started
    }

    /// Stops monitoring `disaster_id`. Returns once the ticker has exited.
    pub async fn stop(&self, disaster_id: DisasterId) -> MonitoringStatus {
        let Some(slot) = self.existing_slot(disaster_id).await else {
            return MonitoringStatus::NotActive;
        };
        let mut guard = slot.lock().await;
        let Some(active) = guard.active.take() else {
            return MonitoringStatus::NotActive;
        };
        active.shutdown().await;
        self.retire(disaster_id, &slot, &mut guard).await;
        drop(guard);

        tracing::info!(%disaster_id, "monitoring stopped");
        MonitoringStatus::Stopped
    }

    /// Stops every session started by `subscriber`. Returns the disasters
    /// whose sessions were stopped.
    pub async fn stop_owned_by(&self, subscriber: SubscriberId) -> Vec<DisasterId> {
        let snapshot: Vec<(DisasterId, Arc<Mutex<Slot>>)> = self
            .slots
            .read()
            .await
            .iter()
            .map(|(id, slot)| (*id, Arc::clone(slot)))
            .collect();

        let mut stopped = Vec::new();
        for (disaster_id, slot) in snapshot {
            let mut guard = slot.lock().await;
            let owned = guard
                .active
                .as_ref()
                .is_some_and(|a| a.session.subscriber == subscriber);
            if !owned {
                continue;
            }
            if let Some(active) = guard.active.take() {
                active.shutdown().await;
                self.retire(disaster_id, &slot, &mut guard).await;
                stopped.push(disaster_id);
            }
        }

        if !stopped.is_empty() {
            tracing::info!(%subscriber, count = stopped.len(), "stopped monitoring on disconnect");
        }
        stopped
    }

    /// Stops every active session.
    pub async fn stop_all(&self) -> usize {
        let snapshot: Vec<(DisasterId, Arc<Mutex<Slot>>)> = self
            .slots
            .read()
            .await
            .iter()
            .map(|(id, slot)| (*id, Arc::clone(slot)))
            .collect();
        let mut stopped = 0;
        for (disaster_id, slot) in snapshot {
            let mut guard = slot.lock().await;
            if let Some(active) = guard.active.take() {
                active.shutdown().await;
                self.retire(disaster_id, &slot, &mut guard).await;
                stopped += 1;
            }
        }
        stopped
    }

    /// Marks an emptied slot retired and unlinks it. Called with the slot
    /// lock held.
    async fn retire(&self, disaster_id: DisasterId, slot: &Arc<Mutex<Slot>>, guard: &mut Slot) {
        guard.retired = true;
        let mut slots = self.slots.write().await;
        if slots
            .get(&disaster_id)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
        {
            slots.remove(&disaster_id);
        }
    }

    /// Number of disasters with a live slot.
    pub async fn slot_count(&self) -> usize {
        self.slots.read().await.len()
    }

    /// Returns `true` if a session is running for `disaster_id`.
    pub async fn is_active(&self, disaster_id: DisasterId) -> bool {
        match self.existing_slot(disaster_id).await {
            Some(slot) => slot.lock().await.active.is_some(),
            None => false,
        }
    }

    /// Lists running sessions, oldest first.
    pub async fn active_sessions(&self) -> Vec<MonitoringSession> {
        let snapshot: Vec<Arc<Mutex<Slot>>> =
            self.slots.read().await.values().map(Arc::clone).collect();
        let mut sessions = Vec::new();
        for slot in snapshot {
            if let Some(active) = slot.lock().await.active.as_ref() {
                sessions.push(active.session.clone());
            }
        }
        sessions.sort_by_key(|s| s.started_at);
        sessions
    }

    /// Adds field activity to the disaster's next tick. Ignored when no
    /// session is running.
    pub async fn record_activity(&self, disaster_id: DisasterId, activity: ActivityCounters) {
        let Some(slot) = self.existing_slot(disaster_id).await else {
            return;
        };
        let slot = slot.lock().await;
        if let Some(active) = slot.active.as_ref() {
            active.counters.lock().await.add(activity);
        }
    }
}

#[derive(Debug)]
struct TickerContext {
    disaster_id: DisasterId,
    keywords: BTreeSet<String>,
    started_at: DateTime<Utc>,
    interval: Duration,
    sink: Arc<dyn EventSink>,
    counters: Arc<Mutex<ActivityCounters>>,
}

async fn run_ticker(ctx: TickerContext, mut cancelled: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval_at(Instant::now() + ctx.interval, ctx.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            biased;
            changed = cancelled.changed() => {
                if changed.is_err() || *cancelled.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if *cancelled.borrow() {
                    break;
                }
                tick += 1;
                let activity = ctx.counters.lock().await.take();
                let payload = json!({
                    "disaster_id": ctx.disaster_id,
                    "tick": tick,
                    "new_reports": activity.new_reports,
                    "urgent_alerts": activity.urgent_alerts,
                    "resources_updated": activity.resources_updated,
                    "keywords": ctx.keywords,
                    "started_at": ctx.started_at,
                });
                let delivered = ctx
                    .sink
                    .emit(HubEvent::for_disaster(EventType::MonitoringTick, ctx.disaster_id, payload))
                    .await;
                tracing::debug!(disaster_id = %ctx.disaster_id, tick, delivered, "monitoring tick");
            }
        }
    }
}
