//! Configuration loading
//!
//! Environment-driven application configuration.

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, ConfigError, Environment, GatewayConfig, RateLimitConfig, ServerConfig,
};
