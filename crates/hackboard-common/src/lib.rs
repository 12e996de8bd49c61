//! # hackboard-common
//!
//! Shared utilities for the hackboard real-time stack: configuration loading,
//! unified error types, and telemetry setup.

pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{AppConfig, ConfigError, Environment, RateLimitConfig, ServerConfig};
pub use error::{AppError, AppResult, ErrorResponse};
pub use telemetry::TracingConfig;
