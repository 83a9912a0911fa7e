//! Subscriber identity and the receiving end of a hub connection.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use utoipa::ToSchema;

use crate::domain::HubEvent;

/// Identifies one connected observer (e.g. one WebSocket connection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct SubscriberId(uuid::Uuid);

impl SubscriberId {
    /// Creates a new random id.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A live connection to the hub: the subscriber id plus its event queue.
///
/// Dropping the receiver does not unregister the subscriber; call
/// [`super::EventHub::on_disconnect`] for that.
#[derive(Debug)]
pub struct Subscription {
    /// Id to use for join/leave/monitoring calls.
    pub id: SubscriberId,
    /// Events delivered to this subscriber, in per-room publish order.
    pub events: mpsc::Receiver<HubEvent>,
}
