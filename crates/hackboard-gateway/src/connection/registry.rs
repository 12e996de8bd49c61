//! Connection registry
//!
//! The single authoritative table of live connections and their room
//! membership. One lock guards both the connection table and the room index:
//! a membership move commits atomically, so queries never observe a
//! connection in two rooms or transiently in none.

use super::Connection;
use hackboard_core::{ConnectionId, ProjectId};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Registered state of one connection.
struct ConnectionEntry {
    connection: Arc<Connection>,
    room: Option<ProjectId>,
    display_name: Option<String>,
}

/// Tables guarded together by the registry lock.
#[derive(Default)]
struct RegistryInner {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    rooms: HashMap<ProjectId, HashSet<ConnectionId>>,
}

impl RegistryInner {
    /// Drop a connection from its room's member set, pruning empty rooms.
    fn remove_from_room(&mut self, id: &ConnectionId, room: &ProjectId) {
        if let Some(members) = self.rooms.get_mut(room) {
            members.remove(id);
            if members.is_empty() {
                self.rooms.remove(room);
            }
        }
    }
}

/// A committed membership change.
///
/// The caller announces it in order: `left` before `joined`, always.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomTransition {
    pub connection_id: ConnectionId,
    pub left: Option<ProjectId>,
    pub joined: Option<ProjectId>,
    pub display_name: Option<String>,
}

/// Authoritative map of live connections and room membership.
pub struct ConnectionRegistry {
    inner: RwLock<RegistryInner>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Create a registry wrapped in `Arc`.
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a connection with no room. Idempotent: re-registering a live
    /// connection keeps its current state.
    pub fn register(&self, connection: Arc<Connection>) {
        let mut inner = self.inner.write();
        let id = connection.id().clone();

        if inner.connections.contains_key(&id) {
            tracing::debug!(connection_id = %id, "Connection already registered");
            return;
        }

        inner.connections.insert(
            id.clone(),
            ConnectionEntry {
                connection,
                room: None,
                display_name: None,
            },
        );

        tracing::debug!(connection_id = %id, "Connection registered");
    }

    /// Move a connection into a room, leaving any current one.
    ///
    /// Returns the committed transition, or `None` if the connection is not
    /// registered (already disconnected). The old and new membership change
    /// under one lock acquisition.
    pub fn set_room(
        &self,
        id: &ConnectionId,
        room: ProjectId,
        display_name: Option<String>,
    ) -> Option<RoomTransition> {
        let mut inner = self.inner.write();

        let Some(entry) = inner.connections.get_mut(id) else {
            tracing::debug!(connection_id = %id, "set_room on unknown connection");
            return None;
        };

        if display_name.is_some() {
            entry.display_name = display_name;
        }
        let old_room = entry.room.replace(room.clone());
        let name = entry.display_name.clone();

        if let Some(old) = &old_room {
            inner.remove_from_room(id, old);
        }
        inner.rooms.entry(room.clone()).or_default().insert(id.clone());

        tracing::debug!(
            connection_id = %id,
            room = %room,
            left = old_room.as_ref().map(ProjectId::as_str).unwrap_or("-"),
            "Connection moved into room"
        );

        Some(RoomTransition {
            connection_id: id.clone(),
            left: old_room,
            joined: Some(room),
            display_name: name,
        })
    }

    /// Explicit leave: the connection stays registered with no room.
    ///
    /// Returns the transition, or `None` if the connection is unknown or was
    /// not in a room.
    pub fn clear_room(&self, id: &ConnectionId) -> Option<RoomTransition> {
        let mut inner = self.inner.write();

        let (old_room, name) = {
            let entry = inner.connections.get_mut(id)?;
            (entry.room.take()?, entry.display_name.clone())
        };

        inner.remove_from_room(id, &old_room);

        tracing::debug!(connection_id = %id, room = %old_room, "Connection left room");

        Some(RoomTransition {
            connection_id: id.clone(),
            left: Some(old_room),
            joined: None,
            display_name: name,
        })
    }

    /// Remove a connection entirely. The first call wins; later calls for the
    /// same id are no-ops, so a physical disconnect is processed exactly once.
    ///
    /// Returns the final transition when the connection was in a room.
    pub fn unregister(&self, id: &ConnectionId) -> Option<RoomTransition> {
        let mut inner = self.inner.write();

        let entry = inner.connections.remove(id)?;
        tracing::debug!(connection_id = %id, "Connection unregistered");

        let old_room = entry.room?;
        inner.remove_from_room(id, &old_room);

        Some(RoomTransition {
            connection_id: id.clone(),
            left: Some(old_room),
            joined: None,
            display_name: entry.display_name,
        })
    }

    /// Get all live connections.
    #[must_use]
    pub fn list_all(&self) -> Vec<Arc<Connection>> {
        self.inner
            .read()
            .connections
            .values()
            .map(|entry| Arc::clone(&entry.connection))
            .collect()
    }

    /// Snapshot the current members of a room.
    #[must_use]
    pub fn list_by_room(&self, room: &ProjectId) -> Vec<Arc<Connection>> {
        let inner = self.inner.read();
        inner
            .rooms
            .get(room)
            .map(|members| {
                members
                    .iter()
                    .filter_map(|id| inner.connections.get(id))
                    .map(|entry| Arc::clone(&entry.connection))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check whether a connection is registered.
    #[must_use]
    pub fn exists(&self, id: &ConnectionId) -> bool {
        self.inner.read().connections.contains_key(id)
    }

    /// The room a connection currently belongs to.
    #[must_use]
    pub fn room_of(&self, id: &ConnectionId) -> Option<ProjectId> {
        self.inner
            .read()
            .connections
            .get(id)
            .and_then(|entry| entry.room.clone())
    }

    /// Number of live connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.inner.read().connections.len()
    }

    /// Number of rooms with at least one member.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.inner.read().rooms.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("ConnectionRegistry")
            .field("connections", &inner.connections.len())
            .field("rooms", &inner.rooms.len())
            .finish()
    }
}
