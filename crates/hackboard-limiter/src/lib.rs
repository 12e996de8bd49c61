//! # hackboard-limiter
//!
//! Keyed fixed-window rate limiting for the hackboard real-time layer.
//!
//! One [`RateLimiter`] instance is shared by the HTTP routes (through
//! [`middleware::rate_limit_middleware`]) and by the gateway's admission gate
//! for events on persistent connections. Counting is fixed-window on purpose:
//! O(1) memory and time per key, accepting up to ~2x burst at window
//! boundaries.

pub mod context;
pub mod middleware;
pub mod options;

mod limiter;

pub use context::{RequestContext, UNKNOWN_KEY};
pub use limiter::{RateLimitDecision, RateLimiter, SweeperHandle};
pub use options::{KeyFn, LimiterError, OnExceeded, RateLimiterOptions, SkipFn};
