//! Event Hub: rooms keyed by disaster and fan-out to subscribers.
//!
//! ```text
//!  producers ──▶ EventSink::emit ──▶ Broadcaster ──try_send──▶ subscriber queues
//!                                      │                          (bounded mpsc)
//!                                      └─ rooms: DisasterId → {SubscriberId}
//! ```
//!
//! Delivery is at-most-once per subscriber with no replay: a subscriber that
//! joins a room sees only events published after the join.

mod broadcaster;
mod event_hub;
mod subscriber;

pub use broadcaster::Broadcaster;
pub use event_hub::{DisconnectSummary, EventHub};
pub use subscriber::{SubscriberId, Subscription};
