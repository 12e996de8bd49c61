//! Telemetry setup
//!
//! Tracing subscriber initialization.

mod tracing_setup;

pub use tracing_setup::{TracingConfig, TracingError};
