//! Shared application state injected into all Axum handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{IdentityResolver, StaticIdentities};
use crate::domain::EventSink;
use crate::hub::EventHub;
use crate::location::LocationResolver;
use crate::persistence::DisasterStorage;
use crate::service::DisasterService;

/// Default upper bound on a single HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Disaster aggregate service for all business logic.
    pub disaster_service: Arc<DisasterService>,
    /// Event hub for rooms, alerts and monitoring.
    pub hub: EventHub,
    /// Location resolver for the geocoding endpoints.
    pub resolver: Arc<LocationResolver>,
    /// Caller token resolution.
    pub identities: Arc<dyn IdentityResolver>,
    /// Radius applied to proximity listings without an explicit radius.
    pub default_radius_km: f64,
    /// Upper bound on a single HTTP request; WebSocket sessions are not
    /// affected once upgraded.
    pub request_timeout: Duration,
}

impl AppState {
    /// Wires the service layer: the disaster service emits into `hub`.
    #[must_use]
    pub fn new(
        storage: Arc<dyn DisasterStorage>,
        resolver: LocationResolver,
        hub: EventHub,
        default_radius_km: f64,
    ) -> Self {
        let resolver = Arc::new(resolver);
        let sink: Arc<dyn EventSink> = Arc::new(hub.clone());
        let disaster_service = Arc::new(DisasterService::new(storage, Arc::clone(&resolver), sink));
        Self {
            disaster_service,
            hub,
            resolver,
            identities: Arc::new(StaticIdentities::builtin()),
            default_radius_km,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Replaces the identity table.
    #[must_use]
    pub fn with_identities(mut self, identities: Arc<dyn IdentityResolver>) -> Self {
        self.identities = identities;
        self
    }
}
