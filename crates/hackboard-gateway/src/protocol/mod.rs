//! Gateway wire protocol
//!
//! JSON frames exchanged with clients over the WebSocket.

mod messages;

pub use messages::{ClientFrame, FrameError, ProtocolError, ServerFrame};
