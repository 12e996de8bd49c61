//! Handler error types

use thiserror::Error;

/// Handler error type
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Invalid payload received
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The connection's outbound channel is gone
    #[error("Connection closed")]
    ConnectionClosed,

    /// Frame referenced a connection the registry no longer knows
    #[error("Connection not registered")]
    NotRegistered,
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
