//! Test harness helpers

use hackboard_core::{ConnectionId, ProjectId};
use hackboard_gateway::{
    AdmissionGate, Connection, ConnectionRegistry, RoomBroadcaster, ServerFrame,
};
use hackboard_limiter::{RateLimiter, RateLimiterOptions};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// The real-time layer wired up in-process, no sockets.
pub struct TestHarness {
    pub registry: Arc<ConnectionRegistry>,
    pub broadcaster: Arc<RoomBroadcaster>,
    pub gate: Arc<AdmissionGate>,
    pub limiter: Arc<RateLimiter>,
}

impl TestHarness {
    /// Build the graph with the given limiter window and max.
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self::with_options(
            RateLimiterOptions::builder(window, max_requests)
                .build()
                .expect("valid test options"),
        )
    }

    /// Build the graph around custom limiter options.
    pub fn with_options(options: RateLimiterOptions) -> Self {
        let limiter = RateLimiter::new_shared(options);
        let registry = ConnectionRegistry::new_shared();
        let broadcaster = RoomBroadcaster::new_shared(Arc::clone(&registry));
        let gate = AdmissionGate::new_shared(Arc::clone(&limiter));

        Self {
            registry,
            broadcaster,
            gate,
            limiter,
        }
    }

    /// Register a connection backed by an mpsc receiver standing in for the
    /// socket pump.
    pub fn connect(&self, id: &str, addr: &str) -> (Arc<Connection>, mpsc::Receiver<ServerFrame>) {
        let (tx, rx) = mpsc::channel(32);
        let connection = Connection::new(
            ConnectionId::from(id),
            Some(addr.parse().expect("valid test address")),
            tx,
        );
        self.registry.register(Arc::clone(&connection));
        (connection, rx)
    }

    /// Register a connection and put it straight into a room.
    pub fn connect_in_room(
        &self,
        id: &str,
        addr: &str,
        room: &str,
    ) -> (Arc<Connection>, mpsc::Receiver<ServerFrame>) {
        let (connection, rx) = self.connect(id, addr);
        self.registry
            .set_room(connection.id(), ProjectId::new(room), None)
            .expect("connection just registered");
        (connection, rx)
    }
}

/// Drain every frame currently queued on a receiver.
pub fn drain(rx: &mut mpsc::Receiver<ServerFrame>) -> Vec<ServerFrame> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(frame);
    }
    frames
}
