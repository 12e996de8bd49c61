//! Frame definitions
//!
//! Client frames are requests on the persistent connection; server frames are
//! events, acknowledgments, and structured errors. Denials arrive as `error`
//! frames on the connection's own channel, never as a close.

use hackboard_core::{BoardEventType, ConnectionId, ProjectId};
use serde::{Deserialize, Serialize};

/// Frames sent by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Subscribe to a project room, leaving any current one first
    Join {
        project_id: ProjectId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
    },
    /// Leave the current room, staying connected
    Leave,
    /// Liveness probe
    Ping,
}

/// Frames sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ServerFrame {
    /// First frame after upgrade, carrying the assigned connection id
    Welcome { connection_id: ConnectionId },
    /// Broadcast event scoped to the connection's room
    Event {
        event: BoardEventType,
        data: serde_json::Value,
    },
    /// Structured, recoverable error
    Error { error: FrameError },
    /// Liveness probe response
    Pong,
}

/// Error payload of an `error` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl FrameError {
    /// Build an error payload from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Attach machine-readable details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl ClientFrame {
    /// Parse a frame from its JSON text.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}

impl ServerFrame {
    /// Serialize a frame to JSON text.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Shorthand for a broadcast event frame.
    #[must_use]
    pub fn event(event: BoardEventType, data: serde_json::Value) -> Self {
        Self::Event { event, data }
    }

    /// Shorthand for an error frame.
    #[must_use]
    pub fn error(error: FrameError) -> Self {
        Self::Error { error }
    }
}

/// Frame (de)serialization errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Failed to decode frame: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),
}
