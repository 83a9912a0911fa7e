//! # disaster-hub
//!
//! Real-time coordination hub for disaster response.
//!
//! Contributors create and update disaster records; observers connected
//! over WebSocket join a disaster's room and receive every change, field
//! report and monitoring summary for it, plus urgent alerts broadcast to
//! everyone.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)          x-user-id → User (auth/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── DisasterService (service/) ──▶ LocationResolver (location/)
//!     │        │                            ├── extractor
//!     │        │ EventSink                  └── geocoder chain
//!     │        ▼
//!     ├── EventHub (hub/) ◀── MonitoringRegistry (monitoring/)
//!     │     rooms + fan-out      one ticker task per disaster
//!     │
//!     └── DisasterStorage (persistence/): in-memory or PostgreSQL
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod hub;
pub mod location;
pub mod monitoring;
pub mod persistence;
pub mod service;
pub mod ws;
