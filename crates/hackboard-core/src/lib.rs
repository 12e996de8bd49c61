//! # hackboard-core
//!
//! Domain layer for the hackboard real-time stack: opaque identifiers and the
//! board event vocabulary. This crate has zero dependencies on infrastructure
//! (web framework, transport, etc.).

pub mod events;
pub mod ids;

// Re-export commonly used types at crate root
pub use events::BoardEventType;
pub use ids::{ConnectionId, ProjectId};
