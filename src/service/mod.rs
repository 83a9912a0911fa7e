//! Service layer: the disaster aggregate lifecycle.
//!
//! [`DisasterService`] validates and authorizes mutations, runs the
//! location resolver, maintains the audit trail and emits events through an
//! abstract [`crate::domain::EventSink`].

pub mod disaster_service;

pub use disaster_service::{CreatedDisaster, DisasterService};
