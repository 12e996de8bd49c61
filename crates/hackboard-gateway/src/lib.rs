//! # hackboard-gateway
//!
//! Real-time gateway for the hackboard: the connection registry, room
//! fan-out, admission control for connection events, and the WebSocket
//! server they hang off.

pub mod admission;
pub mod broadcast;
pub mod connection;
pub mod handlers;
pub mod protocol;
pub mod server;

pub use admission::{AdmissionDenied, AdmissionGate};
pub use broadcast::RoomBroadcaster;
pub use connection::{Connection, ConnectionRegistry, RoomTransition};
pub use protocol::{ClientFrame, FrameError, ServerFrame};
pub use server::GatewayState;
