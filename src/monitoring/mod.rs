//! Monitoring Session Registry.
//!
//! A monitoring session is a periodic task bound to one disaster that
//! summarizes field activity into a `monitoring.tick` event for the
//! disaster's room. At most one session runs per disaster; starting a
//! second one is reported as [`MonitoringStatus::AlreadyActive`], never an
//! error. Stopping is synchronous: once [`MonitoringRegistry::stop`]
//! returns, no further tick for that session is emitted.

mod registry;
mod session;

pub use registry::MonitoringRegistry;
pub use session::{ActivityCounters, MonitoringSession, MonitoringStatus};
