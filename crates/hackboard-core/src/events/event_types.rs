//! Board event types
//!
//! Defines all event names carried in broadcast frames. Each event is scoped
//! to the room of the project owning the affected entity and carries that
//! entity's full current representation as an opaque JSON payload.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Board event types
///
/// These are the event names sent in the `event` field of broadcast frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BoardEventType {
    // Task board events
    /// New task added to the board
    TaskCreated,
    /// Task fields changed
    TaskUpdated,
    /// Task moved between columns
    TaskMoved,
    /// Task removed from the board
    TaskDeleted,

    // Submission events
    /// Team submitted their project
    SubmissionCreated,
    /// Submission replaced or edited
    SubmissionUpdated,

    // Roster / presence events
    /// A member joined the project room
    MemberJoined,
    /// A member left the project room
    MemberLeft,

    // Status feed events
    /// Status update logged against the project
    StatusLogged,
}

impl BoardEventType {
    /// Get the wire name of the event type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreated => "task:created",
            Self::TaskUpdated => "task:updated",
            Self::TaskMoved => "task:moved",
            Self::TaskDeleted => "task:deleted",
            Self::SubmissionCreated => "submission:created",
            Self::SubmissionUpdated => "submission:updated",
            Self::MemberJoined => "member:joined",
            Self::MemberLeft => "member:left",
            Self::StatusLogged => "status:logged",
        }
    }

    /// Parse an event type from its wire name
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "task:created" => Some(Self::TaskCreated),
            "task:updated" => Some(Self::TaskUpdated),
            "task:moved" => Some(Self::TaskMoved),
            "task:deleted" => Some(Self::TaskDeleted),
            "submission:created" => Some(Self::SubmissionCreated),
            "submission:updated" => Some(Self::SubmissionUpdated),
            "member:joined" => Some(Self::MemberJoined),
            "member:left" => Some(Self::MemberLeft),
            "status:logged" => Some(Self::StatusLogged),
            _ => None,
        }
    }
}

impl fmt::Display for BoardEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<BoardEventType> for String {
    fn from(event: BoardEventType) -> Self {
        event.as_str().to_string()
    }
}

impl TryFrom<String> for BoardEventType {
    type Error = UnknownEventType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or(UnknownEventType(value))
    }
}

/// Error returned when deserializing an unrecognized event name
#[derive(Debug, thiserror::Error)]
#[error("Unknown board event type: {0}")]
pub struct UnknownEventType(pub String);
