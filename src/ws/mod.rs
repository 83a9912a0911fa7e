//! WebSocket layer: connection handling and command dispatch.
//!
//! The endpoint at `/ws` registers each connection as a hub subscriber.
//! Clients join disaster rooms, control monitoring sessions and push field
//! updates with commands; hub events arrive as `event` messages. Closing
//! the socket runs the hub's disconnect cleanup.

pub mod connection;
pub mod handler;
pub mod messages;
