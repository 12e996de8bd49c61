//! Admission gate
//!
//! Gates events on a persistent connection through the shared rate limiter.
//! A denial is a structured `error` frame on the connection's own channel
//! with retry guidance; the socket stays open and the process stays up.

use crate::connection::Connection;
use crate::protocol::{FrameError, ServerFrame};
use hackboard_common::AppError;
use hackboard_limiter::{RateLimitDecision, RateLimiter, RequestContext};
use serde_json::json;
use std::sync::Arc;

/// The limit was exceeded; the error frame has already been delivered.
#[derive(Debug, thiserror::Error)]
#[error("Rate limit exceeded, retry in {retry_after_secs}s")]
pub struct AdmissionDenied {
    pub retry_after_secs: u64,
}

/// Gates connection events through the shared limiter.
pub struct AdmissionGate {
    limiter: Arc<RateLimiter>,
}

impl AdmissionGate {
    /// Create a gate over the shared limiter.
    #[must_use]
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }

    /// Create a gate wrapped in `Arc`.
    #[must_use]
    pub fn new_shared(limiter: Arc<RateLimiter>) -> Arc<Self> {
        Arc::new(Self::new(limiter))
    }

    /// Check one connection event against the limiter.
    ///
    /// The key defaults to the connection's remote address via the limiter's
    /// key function, falling back to the shared sentinel when the transport
    /// never learned an address. On denial the structured error is pushed to
    /// the connection and `Err` tells the caller to skip business logic.
    pub async fn intercept(
        &self,
        connection: &Connection,
    ) -> Result<RateLimitDecision, AdmissionDenied> {
        let ctx = RequestContext {
            remote_addr: connection.remote_addr(),
            project_id: None,
            path: None,
        };

        let decision = self.limiter.check(&ctx);
        if decision.allowed {
            return Ok(decision);
        }

        tracing::debug!(
            connection_id = %connection.id(),
            key = %decision.key,
            retry_after_secs = decision.retry_after_secs,
            "Connection event rate limited"
        );

        let frame = ServerFrame::error(
            FrameError::new(
                AppError::RateLimitExceeded.error_code(),
                format!(
                    "Too many requests, retry in {} seconds",
                    decision.retry_after_secs
                ),
            )
            .with_details(json!({
                "limit": decision.limit,
                "windowMs": decision.window_ms,
                "retryAfter": decision.retry_after_secs,
            })),
        );

        // Best effort: a connection that disconnected mid-check just misses
        // its error frame.
        if connection.send(frame).await.is_err() {
            tracing::trace!(
                connection_id = %connection.id(),
                "Could not deliver rate limit error to closed connection"
            );
        }

        Err(AdmissionDenied {
            retry_after_secs: decision.retry_after_secs,
        })
    }
}

impl std::fmt::Debug for AdmissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionGate")
            .field("limiter", &self.limiter)
            .finish()
    }
}
