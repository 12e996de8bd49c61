//! Board event vocabulary
//!
//! Event names delivered to room subscribers.

mod event_types;

pub use event_types::{BoardEventType, UnknownEventType};
