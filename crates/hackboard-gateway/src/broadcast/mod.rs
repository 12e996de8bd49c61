//! Room fan-out
//!
//! Delivers board events to every current member of a project room.

mod broadcaster;

pub use broadcaster::RoomBroadcaster;
