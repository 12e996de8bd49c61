//! Individual WebSocket connection
//!
//! A lightweight handle around a connection's identity and its outbound
//! channel. Room membership lives in the registry, not here, so membership
//! moves commit under one lock.

use crate::protocol::ServerFrame;
use hackboard_core::ConnectionId;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// A single live connection.
pub struct Connection {
    /// Server-assigned connection id
    id: ConnectionId,

    /// Remote peer address, when the transport knows it
    remote_addr: Option<IpAddr>,

    /// Channel feeding the connection's outbound socket pump
    sender: mpsc::Sender<ServerFrame>,

    /// Connection creation time
    created_at: Instant,
}

impl Connection {
    /// Create a new connection handle.
    pub fn new(
        id: ConnectionId,
        remote_addr: Option<IpAddr>,
        sender: mpsc::Sender<ServerFrame>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            remote_addr,
            sender,
            created_at: Instant::now(),
        })
    }

    /// Get the connection id.
    #[must_use]
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Get the remote peer address, if known.
    #[must_use]
    pub fn remote_addr(&self) -> Option<IpAddr> {
        self.remote_addr
    }

    /// Get connection age.
    #[must_use]
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    /// Send a frame to this connection.
    pub async fn send(
        &self,
        frame: ServerFrame,
    ) -> Result<(), mpsc::error::SendError<ServerFrame>> {
        self.sender.send(frame).await
    }

    /// Check if the outbound channel is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("remote_addr", &self.remote_addr)
            .field("created_at", &self.created_at)
            .finish()
    }
}
