//! Domain layer: identifiers, the disaster aggregate, audit trail, users
//! and the event types flowing through the hub.

pub mod audit;
pub mod disaster;
pub mod disaster_id;
pub mod event_sink;
pub mod hub_event;
pub mod user;

pub use audit::{AuditAction, AuditEntry, AuditTrail};
pub use disaster::{
    Disaster, DisasterFilter, DisasterListing, DisasterPatch, NearFilter, NewDisaster,
    normalize_tags,
};
pub use disaster_id::DisasterId;
pub use event_sink::{EventSink, NullSink};
pub use hub_event::{EventType, HubEvent};
pub use user::{Role, User};
