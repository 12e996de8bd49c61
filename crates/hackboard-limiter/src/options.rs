//! Limiter options
//!
//! Explicit configuration with named capability fields, built through a
//! validating builder. Construction is the only place limiting treats a bad
//! value as a programming error.

use crate::context::RequestContext;
use hackboard_common::RateLimitConfig;
use std::sync::Arc;
use std::time::Duration;

/// Derives the string key a context is counted under. Must be pure and total.
pub type KeyFn = Arc<dyn Fn(&RequestContext) -> String + Send + Sync>;

/// Predicate exempting a context from counting entirely.
pub type SkipFn = Arc<dyn Fn(&RequestContext) -> bool + Send + Sync>;

/// Observer invoked for every over-limit attempt.
pub type OnExceeded = Arc<dyn Fn(&RequestContext) + Send + Sync>;

/// Configuration for a [`RateLimiter`](crate::RateLimiter).
#[derive(Clone)]
pub struct RateLimiterOptions {
    pub(crate) window: Duration,
    pub(crate) max_requests: u32,
    pub(crate) key_fn: KeyFn,
    pub(crate) skip_fn: Option<SkipFn>,
    pub(crate) on_exceeded: Option<OnExceeded>,
    pub(crate) skip_successful_requests: bool,
    pub(crate) skip_failed_requests: bool,
}

impl RateLimiterOptions {
    /// Start building options for the given window and limit.
    #[must_use]
    pub fn builder(window: Duration, max_requests: u32) -> RateLimiterOptionsBuilder {
        RateLimiterOptionsBuilder {
            window,
            max_requests,
            key_fn: None,
            skip_fn: None,
            on_exceeded: None,
            skip_successful_requests: false,
            skip_failed_requests: false,
        }
    }

    /// Build options straight from application config, with default keying.
    pub fn from_config(config: &RateLimitConfig) -> Result<Self, LimiterError> {
        Self::builder(
            Duration::from_millis(config.window_ms),
            config.max_requests,
        )
        .build()
    }

    /// Fixed window length.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Maximum attempts counted per key per window.
    #[must_use]
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }
}

impl std::fmt::Debug for RateLimiterOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterOptions")
            .field("window", &self.window)
            .field("max_requests", &self.max_requests)
            .field("skip_successful_requests", &self.skip_successful_requests)
            .field("skip_failed_requests", &self.skip_failed_requests)
            .finish()
    }
}

/// Builder for [`RateLimiterOptions`].
pub struct RateLimiterOptionsBuilder {
    window: Duration,
    max_requests: u32,
    key_fn: Option<KeyFn>,
    skip_fn: Option<SkipFn>,
    on_exceeded: Option<OnExceeded>,
    skip_successful_requests: bool,
    skip_failed_requests: bool,
}

impl RateLimiterOptionsBuilder {
    /// Override the key derivation. Defaults to remote address with the
    /// `"unknown"` sentinel fallback.
    #[must_use]
    pub fn key_fn(mut self, key_fn: KeyFn) -> Self {
        self.key_fn = Some(key_fn);
        self
    }

    /// Exempt matching contexts from counting.
    #[must_use]
    pub fn skip_fn(mut self, skip_fn: SkipFn) -> Self {
        self.skip_fn = Some(skip_fn);
        self
    }

    /// Observe every over-limit attempt.
    #[must_use]
    pub fn on_exceeded(mut self, on_exceeded: OnExceeded) -> Self {
        self.on_exceeded = Some(on_exceeded);
        self
    }

    /// Refund attempts whose response completed successfully.
    #[must_use]
    pub fn skip_successful_requests(mut self, skip: bool) -> Self {
        self.skip_successful_requests = skip;
        self
    }

    /// Refund attempts whose response completed with an error status.
    #[must_use]
    pub fn skip_failed_requests(mut self, skip: bool) -> Self {
        self.skip_failed_requests = skip;
        self
    }

    /// Validate and build the options.
    ///
    /// # Errors
    /// Fails fast when the window is zero or `max_requests` is zero.
    pub fn build(self) -> Result<RateLimiterOptions, LimiterError> {
        if self.window.is_zero() {
            return Err(LimiterError::InvalidConfiguration(
                "window must be positive".to_string(),
            ));
        }
        if self.max_requests < 1 {
            return Err(LimiterError::InvalidConfiguration(
                "max_requests must be at least 1".to_string(),
            ));
        }

        Ok(RateLimiterOptions {
            window: self.window,
            max_requests: self.max_requests,
            key_fn: self
                .key_fn
                .unwrap_or_else(|| Arc::new(RequestContext::default_key)),
            skip_fn: self.skip_fn,
            on_exceeded: self.on_exceeded,
            skip_successful_requests: self.skip_successful_requests,
            skip_failed_requests: self.skip_failed_requests,
        })
    }
}

/// Limiter construction errors
#[derive(Debug, thiserror::Error)]
pub enum LimiterError {
    #[error("Invalid rate limiter configuration: {0}")]
    InvalidConfiguration(String),
}
