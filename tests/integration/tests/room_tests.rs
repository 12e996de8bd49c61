//! Room membership and fan-out integration tests
//!
//! Run with: cargo test -p integration-tests --test room_tests

use hackboard_core::{BoardEventType, ProjectId};
use hackboard_gateway::ServerFrame;
use integration_tests::{drain, TestHarness};
use serde_json::json;
use std::time::Duration;

fn harness() -> TestHarness {
    TestHarness::new(Duration::from_millis(60_000), 100)
}

// ============================================================================
// Fan-out scoping
// ============================================================================

#[tokio::test]
async fn test_emit_reaches_exactly_the_room_members() {
    let harness = harness();
    let (_a, mut rx_a) = harness.connect_in_room("a", "10.0.0.1", "proj1");
    let (_b, mut rx_b) = harness.connect_in_room("b", "10.0.0.2", "proj1");
    let (_c, mut rx_c) = harness.connect_in_room("c", "10.0.0.3", "proj2");

    let sent = harness
        .broadcaster
        .emit(
            &ProjectId::new("proj1"),
            BoardEventType::TaskCreated,
            json!({"id": "t1"}),
        )
        .await;
    assert_eq!(sent, 2);

    for rx in [&mut rx_a, &mut rx_b] {
        match rx.recv().await {
            Some(ServerFrame::Event { event, data }) => {
                assert_eq!(event, BoardEventType::TaskCreated);
                assert_eq!(data["id"], "t1");
            }
            other => panic!("expected task:created, got {other:?}"),
        }
    }

    assert!(drain(&mut rx_c).is_empty());
}

#[tokio::test]
async fn test_late_joiner_misses_earlier_events() {
    let harness = harness();
    let room = ProjectId::new("proj1");
    let (_a, _rx_a) = harness.connect_in_room("a", "10.0.0.1", "proj1");

    harness
        .broadcaster
        .emit(&room, BoardEventType::StatusLogged, json!({"n": 1}))
        .await;

    // Joining after the emit returned must not deliver it retroactively.
    let (_b, mut rx_b) = harness.connect_in_room("b", "10.0.0.2", "proj1");
    assert!(drain(&mut rx_b).is_empty());

    harness
        .broadcaster
        .emit(&room, BoardEventType::StatusLogged, json!({"n": 2}))
        .await;
    match rx_b.recv().await {
        Some(ServerFrame::Event { data, .. }) => assert_eq!(data["n"], 2),
        other => panic!("expected status:logged, got {other:?}"),
    }
}

// ============================================================================
// Membership transitions
// ============================================================================

#[tokio::test]
async fn test_moving_rooms_announces_left_then_joined() {
    let harness = harness();
    let (_obs1, mut rx_old) = harness.connect_in_room("obs1", "10.0.0.1", "proj1");
    let (_obs2, mut rx_new) = harness.connect_in_room("obs2", "10.0.0.2", "proj2");
    let (mover, _rx_mover) = harness.connect_in_room("mover", "10.0.0.3", "proj1");

    let transition = harness
        .registry
        .set_room(mover.id(), ProjectId::new("proj2"), None)
        .unwrap();
    harness.broadcaster.announce(&transition).await;

    // Old room observers see exactly one "left".
    let old_frames = drain(&mut rx_old);
    assert_eq!(old_frames.len(), 1);
    assert!(matches!(
        &old_frames[0],
        ServerFrame::Event { event: BoardEventType::MemberLeft, .. }
    ));

    // New room observers see exactly one "joined".
    let new_frames = drain(&mut rx_new);
    assert_eq!(new_frames.len(), 1);
    assert!(matches!(
        &new_frames[0],
        ServerFrame::Event { event: BoardEventType::MemberJoined, .. }
    ));

    // Membership queries reflect only the committed state.
    assert!(harness
        .registry
        .list_by_room(&ProjectId::new("proj1"))
        .iter()
        .all(|c| c.id() != mover.id()));
    assert!(harness
        .registry
        .list_by_room(&ProjectId::new("proj2"))
        .iter()
        .any(|c| c.id() == mover.id()));
}

#[tokio::test]
async fn test_disconnect_announces_one_left_and_clears_membership() {
    let harness = harness();
    let (_obs, mut rx_obs) = harness.connect_in_room("obs", "10.0.0.1", "proj1");
    let (gone, _rx_gone) = harness.connect_in_room("gone", "10.0.0.2", "proj1");

    let transition = harness.registry.unregister(gone.id()).unwrap();
    harness.broadcaster.announce(&transition).await;

    // A duplicate disconnect signal finds nothing to do.
    assert!(harness.registry.unregister(gone.id()).is_none());

    let frames = drain(&mut rx_obs);
    assert_eq!(frames.len(), 1);
    match &frames[0] {
        ServerFrame::Event { event, data } => {
            assert_eq!(*event, BoardEventType::MemberLeft);
            assert_eq!(data["connection_id"], "gone");
        }
        other => panic!("expected member:left, got {other:?}"),
    }

    assert!(!harness.registry.exists(gone.id()));
    assert_eq!(harness.registry.list_by_room(&ProjectId::new("proj1")).len(), 1);
}

// ============================================================================
// Admission-gated joins
// ============================================================================

#[tokio::test]
async fn test_rate_limited_join_leaves_membership_untouched() {
    let harness = TestHarness::new(Duration::from_millis(60_000), 1);
    let (conn, mut rx) = harness.connect_in_room("c1", "10.0.0.1", "proj1");

    // First event from this address uses up the window.
    assert!(harness.gate.intercept(&conn).await.is_ok());

    // The next join attempt is denied on the connection's error channel and
    // business logic never runs, so the room assignment stands.
    assert!(harness.gate.intercept(&conn).await.is_err());
    match rx.recv().await {
        Some(ServerFrame::Error { error }) => {
            assert_eq!(error.code, "RATE_LIMIT_EXCEEDED");
            assert!(error.details.is_some());
        }
        other => panic!("expected error frame, got {other:?}"),
    }

    assert_eq!(
        harness.registry.room_of(conn.id()),
        Some(ProjectId::new("proj1"))
    );
}
