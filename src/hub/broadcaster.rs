//! Room membership and non-blocking fan-out.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc};

use super::{SubscriberId, Subscription};
use crate::domain::{DisasterId, EventSink, HubEvent};

type Room = Arc<RwLock<HashSet<SubscriberId>>>;

/// Room-based broadcaster.
///
/// Each subscriber owns a bounded queue. Publishing copies the recipient
/// list under the room lock, releases it, then hands the event to each
/// queue with `try_send`: a full queue drops the event for that subscriber
/// only. No lock is held while delivering.
///
/// Lock order is `rooms` map, then one room, then `memberships`.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    subscribers: Arc<RwLock<HashMap<SubscriberId, mpsc::Sender<HubEvent>>>>,
    rooms: Arc<RwLock<HashMap<DisasterId, Room>>>,
    memberships: Arc<RwLock<HashMap<SubscriberId, HashSet<DisasterId>>>>,
    buffer: usize,
}

impl Broadcaster {
    /// Creates a broadcaster whose subscriber queues hold `buffer` events.
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            rooms: Arc::new(RwLock::new(HashMap::new())),
            memberships: Arc::new(RwLock::new(HashMap::new())),
            buffer: buffer.max(1),
        }
    }

    /// Registers a new subscriber with an empty room set.
    pub async fn connect(&self) -> Subscription {
        let id = SubscriberId::new();
        let (tx, events) = mpsc::channel(self.buffer);
        self.subscribers.write().await.insert(id, tx);
        tracing::debug!(subscriber = %id, "subscriber connected");
        Subscription { id, events }
    }

    /// Returns `true` while `subscriber` is connected.
    pub async fn is_connected(&self, subscriber: SubscriberId) -> bool {
        self.subscribers.read().await.contains_key(&subscriber)
    }

    /// Adds `subscriber` to the room for `disaster_id`. Idempotent: returns
    /// `false` if it was already a member or is not connected.
    pub async fn join(&self, subscriber: SubscriberId, disaster_id: DisasterId) -> bool {
        if !self.is_connected(subscriber).await {
            tracing::debug!(%subscriber, %disaster_id, "join ignored for unknown subscriber");
            return false;
        }

        loop {
            let room = self.room_or_create(disaster_id).await;
            let inserted = room.write().await.insert(subscriber);

            // An emptied room may have been unlinked between lookup and
            // insert; retry against the live one.
            let live = self
                .rooms
                .read()
                .await
                .get(&disaster_id)
                .is_some_and(|current| Arc::ptr_eq(current, &room));
            if !live {
                continue;
            }

            if inserted {
                self.memberships
                    .write()
                    .await
                    .entry(subscriber)
                    .or_default()
                    .insert(disaster_id);
                tracing::debug!(%subscriber, %disaster_id, "joined room");
            }
            return inserted;
        }
    }

    /// Removes `subscriber` from the room for `disaster_id`. Idempotent:
    /// returns `false` if it was not a member.
    pub async fn leave(&self, subscriber: SubscriberId, disaster_id: DisasterId) -> bool {
        let Some(room) = self.room(disaster_id).await else {
            return false;
        };
        let (removed, now_empty) = {
            let mut members = room.write().await;
            let removed = members.remove(&subscriber);
            (removed, members.is_empty())
        };

        if removed {
            if let Some(rooms) = self.memberships.write().await.get_mut(&subscriber) {
                rooms.remove(&disaster_id);
            }
            tracing::debug!(%subscriber, %disaster_id, "left room");
        }
        if now_empty {
            self.unlink_if_empty(disaster_id).await;
        }
        removed
    }

    /// Unregisters `subscriber` and removes it from every room. Returns the
    /// rooms it was a member of.
    pub async fn disconnect(&self, subscriber: SubscriberId) -> Vec<DisasterId> {
        self.subscribers.write().await.remove(&subscriber);
        let joined: Vec<DisasterId> = self
            .memberships
            .write()
            .await
            .remove(&subscriber)
            .map(|rooms| rooms.into_iter().collect())
            .unwrap_or_default();

        for disaster_id in &joined {
            let Some(room) = self.room(*disaster_id).await else {
                continue;
            };
            let now_empty = {
                let mut members = room.write().await;
                members.remove(&subscriber);
                members.is_empty()
            };
            if now_empty {
                self.unlink_if_empty(*disaster_id).await;
            }
        }

        tracing::debug!(%subscriber, rooms = joined.len(), "subscriber disconnected");
        joined
    }

    /// Delivers `event` to every current member of the room for
    /// `disaster_id`. Returns the number of queues the event was placed in.
    pub async fn publish_to_room(&self, disaster_id: DisasterId, event: &HubEvent) -> usize {
        let members: Vec<SubscriberId> = match self.room(disaster_id).await {
            Some(room) => room.read().await.iter().copied().collect(),
            None => return 0,
        };
        let targets: Vec<(SubscriberId, mpsc::Sender<HubEvent>)> = {
            let subscribers = self.subscribers.read().await;
            members
                .iter()
                .filter_map(|id| subscribers.get(id).map(|tx| (*id, tx.clone())))
                .collect()
        };
        deliver(&targets, event)
    }

    /// Delivers `event` to every connected subscriber.
    pub async fn publish_global(&self, event: &HubEvent) -> usize {
        let targets: Vec<(SubscriberId, mpsc::Sender<HubEvent>)> = self
            .subscribers
            .read()
            .await
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();
        deliver(&targets, event)
    }

    /// Current members of the room for `disaster_id`.
    pub async fn room_members(&self, disaster_id: DisasterId) -> Vec<SubscriberId> {
        match self.room(disaster_id).await {
            Some(room) => room.read().await.iter().copied().collect(),
            None => Vec::new(),
        }
    }

    /// Rooms `subscriber` currently belongs to.
    pub async fn rooms_of(&self, subscriber: SubscriberId) -> Vec<DisasterId> {
        self.memberships
            .read()
            .await
            .get(&subscriber)
            .map(|rooms| rooms.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of non-empty rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Number of connected subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    async fn room(&self, disaster_id: DisasterId) -> Option<Room> {
        self.rooms.read().await.get(&disaster_id).map(Arc::clone)
    }

    async fn room_or_create(&self, disaster_id: DisasterId) -> Room {
        if let Some(room) = self.room(disaster_id).await {
            return room;
        }
        let mut rooms = self.rooms.write().await;
        Arc::clone(rooms.entry(disaster_id).or_default())
    }

    async fn unlink_if_empty(&self, disaster_id: DisasterId) {
        let mut rooms = self.rooms.write().await;
        let empty = match rooms.get(&disaster_id) {
            Some(room) => room.read().await.is_empty(),
            None => false,
        };
        if empty {
            rooms.remove(&disaster_id);
        }
    }
}

fn deliver(targets: &[(SubscriberId, mpsc::Sender<HubEvent>)], event: &HubEvent) -> usize {
    let mut delivered = 0;
    for (subscriber, tx) in targets {
        match tx.try_send(event.clone()) {
            Ok(()) => delivered += 1,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    %subscriber,
                    event_type = %event.event_type,
                    "subscriber queue full, dropping event"
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(%subscriber, "subscriber queue closed");
            }
        }
    }
    delivered
}

#[async_trait]
impl EventSink for Broadcaster {
    async fn emit(&self, event: HubEvent) -> usize {
        if event.event_type.is_global() {
            return self.publish_global(&event).await;
        }
        match event.disaster_id {
            Some(disaster_id) => self.publish_to_room(disaster_id, &event).await,
            None => {
                tracing::warn!(event_type = %event.event_type, "room event without disaster id");
                0
            }
        }
    }
}
