//! Connection tracking
//!
//! Live connection handles and the authoritative room membership table.

mod connection;
mod registry;

pub use connection::Connection;
pub use registry::{ConnectionRegistry, RoomTransition};
