//! Room broadcaster
//!
//! Best-effort, at-most-once fan-out. Membership is snapshotted at emit time;
//! connections joining afterwards do not receive the event, and a member
//! racing its own disconnect may or may not, which the no-ack model accepts.
//! Events emitted in sequence from one origin reach each member through that
//! member's FIFO channel in emit order.

use crate::connection::{ConnectionRegistry, RoomTransition};
use crate::protocol::ServerFrame;
use hackboard_core::{BoardEventType, ProjectId};
use serde_json::json;
use std::sync::Arc;

/// Delivers events to the current members of a room.
pub struct RoomBroadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl RoomBroadcaster {
    /// Create a broadcaster over the given registry.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Create a broadcaster wrapped in `Arc`.
    #[must_use]
    pub fn new_shared(registry: Arc<ConnectionRegistry>) -> Arc<Self> {
        Arc::new(Self::new(registry))
    }

    /// Emit an event to every connection currently in the room.
    ///
    /// The payload is an opaque blob owned by the persistence collaborator.
    /// Returns the number of connections the frame was handed to. An empty
    /// room is a silent no-op.
    pub async fn emit(
        &self,
        room: &ProjectId,
        event: BoardEventType,
        payload: serde_json::Value,
    ) -> usize {
        let members = self.registry.list_by_room(room);
        if members.is_empty() {
            tracing::trace!(room = %room, event = %event, "No members in room, skipping emit");
            return 0;
        }

        let frame = ServerFrame::event(event, payload);
        let mut sent = 0;

        for connection in members {
            if connection.send(frame.clone()).await.is_ok() {
                sent += 1;
            } else {
                // Member disconnected between snapshot and send; accepted race.
                tracing::trace!(
                    room = %room,
                    connection_id = %connection.id(),
                    "Dropping event for closed connection"
                );
            }
        }

        tracing::trace!(room = %room, event = %event, sent, "Event emitted to room");

        sent
    }

    /// Announce a committed membership change: the "left" notification for
    /// the old room always goes out before the "joined" one for the new room.
    pub async fn announce(&self, transition: &RoomTransition) {
        let member = json!({
            "connection_id": transition.connection_id,
            "display_name": transition.display_name,
        });

        if let Some(left) = &transition.left {
            let mut payload = member.clone();
            payload["project_id"] = json!(left);
            self.emit(left, BoardEventType::MemberLeft, payload).await;
        }

        if let Some(joined) = &transition.joined {
            let mut payload = member.clone();
            payload["project_id"] = json!(joined);
            self.emit(joined, BoardEventType::MemberJoined, payload).await;
        }
    }
}

impl std::fmt::Debug for RoomBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomBroadcaster")
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use hackboard_core::ConnectionId;
    use tokio::sync::mpsc;

    fn setup() -> (Arc<ConnectionRegistry>, RoomBroadcaster) {
        let registry = ConnectionRegistry::new_shared();
        let broadcaster = RoomBroadcaster::new(Arc::clone(&registry));
        (registry, broadcaster)
    }

    fn join(
        registry: &ConnectionRegistry,
        id: &str,
        room: &str,
    ) -> mpsc::Receiver<ServerFrame> {
        let (tx, rx) = mpsc::channel(10);
        let conn = Connection::new(ConnectionId::from(id), None, tx);
        registry.register(Arc::clone(&conn));
        registry.set_room(conn.id(), ProjectId::new(room), None);
        rx
    }

    #[tokio::test]
    async fn test_emit_reaches_room_members_only() {
        let (registry, broadcaster) = setup();
        let mut a = join(&registry, "a", "proj1");
        let mut b = join(&registry, "b", "proj1");
        let mut c = join(&registry, "c", "proj2");

        let sent = broadcaster
            .emit(
                &ProjectId::new("proj1"),
                BoardEventType::TaskCreated,
                json!({"id": "t1"}),
            )
            .await;
        assert_eq!(sent, 2);

        for rx in [&mut a, &mut b] {
            match rx.recv().await {
                Some(ServerFrame::Event { event, data }) => {
                    assert_eq!(event, BoardEventType::TaskCreated);
                    assert_eq!(data["id"], "t1");
                }
                other => panic!("expected event frame, got {other:?}"),
            }
        }

        // proj2 member receives nothing.
        assert!(c.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_emit_to_empty_room_is_noop() {
        let (_registry, broadcaster) = setup();

        let sent = broadcaster
            .emit(
                &ProjectId::new("ghost"),
                BoardEventType::TaskDeleted,
                json!({}),
            )
            .await;
        assert_eq!(sent, 0);
    }

    #[tokio::test]
    async fn test_emit_preserves_order_per_member() {
        let (registry, broadcaster) = setup();
        let mut rx = join(&registry, "a", "proj1");
        let room = ProjectId::new("proj1");

        broadcaster
            .emit(&room, BoardEventType::TaskCreated, json!({"seq": 1}))
            .await;
        broadcaster
            .emit(&room, BoardEventType::TaskMoved, json!({"seq": 2}))
            .await;
        broadcaster
            .emit(&room, BoardEventType::TaskDeleted, json!({"seq": 3}))
            .await;

        for expected in 1..=3 {
            match rx.recv().await {
                Some(ServerFrame::Event { data, .. }) => assert_eq!(data["seq"], expected),
                other => panic!("expected event frame, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_closed_member_does_not_block_others() {
        let (registry, broadcaster) = setup();
        let dead = join(&registry, "dead", "proj1");
        drop(dead);
        let mut alive = join(&registry, "alive", "proj1");

        let sent = broadcaster
            .emit(&ProjectId::new("proj1"), BoardEventType::StatusLogged, json!({}))
            .await;
        assert_eq!(sent, 1);
        assert!(matches!(alive.recv().await, Some(ServerFrame::Event { .. })));
    }

    #[tokio::test]
    async fn test_announce_left_before_joined() {
        let (registry, broadcaster) = setup();
        let mut old_room_observer = join(&registry, "obs1", "proj1");
        let mut new_room_observer = join(&registry, "obs2", "proj2");
        let mut mover_rx = join(&registry, "mover", "proj1");

        let transition = registry
            .set_room(
                &ConnectionId::from("mover"),
                ProjectId::new("proj2"),
                Some("ada".to_string()),
            )
            .unwrap();
        broadcaster.announce(&transition).await;

        match old_room_observer.recv().await {
            Some(ServerFrame::Event { event, data }) => {
                assert_eq!(event, BoardEventType::MemberLeft);
                assert_eq!(data["connection_id"], "mover");
                assert_eq!(data["project_id"], "proj1");
            }
            other => panic!("expected member:left, got {other:?}"),
        }

        match new_room_observer.recv().await {
            Some(ServerFrame::Event { event, data }) => {
                assert_eq!(event, BoardEventType::MemberJoined);
                assert_eq!(data["display_name"], "ada");
                assert_eq!(data["project_id"], "proj2");
            }
            other => panic!("expected member:joined, got {other:?}"),
        }

        // The mover is already committed to proj2, so it receives the joined
        // notification but not the left one for its old room.
        match mover_rx.recv().await {
            Some(ServerFrame::Event { event, .. }) => {
                assert_eq!(event, BoardEventType::MemberJoined);
            }
            other => panic!("expected member:joined, got {other:?}"),
        }
    }
}
