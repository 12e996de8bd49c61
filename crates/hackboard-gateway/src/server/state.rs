//! Gateway state
//!
//! Shared dependencies for the gateway server. Each mutable structure (the
//! limiter's counter store, the connection registry) is owned by exactly one
//! component instance here and reached only through its operations.

use crate::admission::AdmissionGate;
use crate::broadcast::RoomBroadcaster;
use crate::connection::ConnectionRegistry;
use hackboard_common::AppConfig;
use hackboard_limiter::{LimiterError, RateLimiter, RateLimiterOptions};
use std::sync::Arc;

/// Gateway application state
#[derive(Clone)]
pub struct GatewayState {
    /// Authoritative connection/room table
    registry: Arc<ConnectionRegistry>,
    /// Room fan-out over the registry
    broadcaster: Arc<RoomBroadcaster>,
    /// Admission control for connection events
    gate: Arc<AdmissionGate>,
    /// Shared limiter (HTTP middleware and gate both check it)
    limiter: Arc<RateLimiter>,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Build the full dependency graph from configuration.
    ///
    /// # Errors
    /// Fails fast when the rate limit configuration is invalid.
    pub fn from_config(config: AppConfig) -> Result<Self, LimiterError> {
        let limiter = RateLimiter::new_shared(RateLimiterOptions::from_config(&config.rate_limit)?);
        let registry = ConnectionRegistry::new_shared();
        let broadcaster = RoomBroadcaster::new_shared(Arc::clone(&registry));
        let gate = AdmissionGate::new_shared(Arc::clone(&limiter));

        Ok(Self {
            registry,
            broadcaster,
            gate,
            limiter,
            config: Arc::new(config),
        })
    }

    /// Get the connection registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Get the room broadcaster.
    #[must_use]
    pub fn broadcaster(&self) -> &Arc<RoomBroadcaster> {
        &self.broadcaster
    }

    /// Get the admission gate.
    #[must_use]
    pub fn gate(&self) -> &Arc<AdmissionGate> {
        &self.gate
    }

    /// Get the shared rate limiter.
    #[must_use]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Get the application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("registry", &self.registry)
            .field("limiter", &self.limiter)
            .finish()
    }
}
