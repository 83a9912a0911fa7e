//! Abstract event emission capability.
//!
//! Producers (the aggregate service, the monitoring registry) depend only on
//! [`EventSink`], never on the hub's concrete type, so each side can be
//! tested with its own sink.

use std::fmt::Debug;

use async_trait::async_trait;

use super::HubEvent;

/// Destination for [`HubEvent`]s.
///
/// Implementations must not block on slow consumers: `emit` returns once
/// the event has been handed to every current recipient's queue (or dropped
/// for recipients whose queue is full).
#[async_trait]
pub trait EventSink: Debug + Send + Sync {
    /// Routes `event` to its recipients. Returns the number of recipients
    /// the event was queued for.
    async fn emit(&self, event: HubEvent) -> usize;
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

#[async_trait]
impl EventSink for NullSink {
    async fn emit(&self, _event: HubEvent) -> usize {
        0
    }
}
