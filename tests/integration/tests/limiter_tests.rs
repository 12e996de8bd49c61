//! Rate limiter integration tests
//!
//! Exercises the shared limiter across the HTTP context and the gateway
//! admission gate.
//!
//! Run with: cargo test -p integration-tests --test limiter_tests

use hackboard_limiter::{RateLimiterOptions, RequestContext, UNKNOWN_KEY};
use integration_tests::TestHarness;
use std::sync::Arc;
use std::time::Duration;

fn ctx(addr: &str) -> RequestContext {
    RequestContext::from_addr(addr.parse().unwrap())
}

// ============================================================================
// Window exhaustion
// ============================================================================

#[tokio::test]
async fn test_three_attempts_against_limit_of_two() {
    let harness = TestHarness::new(Duration::from_millis(60_000), 2);
    let ctx = ctx("203.0.113.7");

    let results: Vec<_> = (0..3).map(|_| harness.limiter.check(&ctx)).collect();

    assert!(results[0].allowed);
    assert!(results[1].allowed);
    assert!(!results[2].allowed);
    assert_eq!(results[2].remaining, 0);
    // The window just opened, so the wait is the full window rounded up.
    assert!((59..=60).contains(&results[2].retry_after_secs));
}

#[tokio::test]
async fn test_quota_recovers_after_window() {
    let harness = TestHarness::new(Duration::from_millis(40), 1);
    let ctx = ctx("203.0.113.7");

    assert!(harness.limiter.check(&ctx).allowed);
    assert!(!harness.limiter.check(&ctx).allowed);

    tokio::time::sleep(Duration::from_millis(60)).await;

    let fresh = harness.limiter.check(&ctx);
    assert!(fresh.allowed);
    assert_eq!(harness.limiter.current_count("203.0.113.7"), Some(1));
}

// ============================================================================
// Outcome refunds
// ============================================================================

#[tokio::test]
async fn test_refunded_successes_do_not_consume_quota() {
    let harness = TestHarness::new(Duration::from_millis(60_000), 2);
    let ctx = ctx("203.0.113.7");

    // Request 1 succeeds and is refunded once its response completes.
    let first = harness.limiter.check(&ctx);
    assert!(first.allowed);
    harness.limiter.record_outcome(&first.key, 1);

    // Requests 2 and 3 are both admitted despite three total attempts
    // against a limit of 2.
    assert!(harness.limiter.check(&ctx).allowed);
    assert!(harness.limiter.check(&ctx).allowed);
}

// ============================================================================
// Key derivation
// ============================================================================

#[tokio::test]
async fn test_composite_keys_track_projects_independently() {
    let options = RateLimiterOptions::builder(Duration::from_millis(60_000), 2)
        .key_fn(Arc::new(RequestContext::composite_key))
        .build()
        .unwrap();
    let harness = TestHarness::with_options(options);

    let proj1 = RequestContext {
        remote_addr: Some("203.0.113.7".parse().unwrap()),
        project_id: Some("proj1".to_string()),
        path: None,
    };
    let proj2 = RequestContext {
        project_id: Some("proj2".to_string()),
        ..proj1.clone()
    };

    // Exhaust proj1's quota from this address.
    assert!(harness.limiter.check(&proj1).allowed);
    assert!(harness.limiter.check(&proj1).allowed);
    assert!(!harness.limiter.check(&proj1).allowed);

    // Same address, different project: quota untouched.
    assert!(harness.limiter.check(&proj2).allowed);
}

#[tokio::test]
async fn test_anonymous_traffic_shares_the_sentinel_bucket() {
    let harness = TestHarness::new(Duration::from_millis(60_000), 2);

    let anonymous = RequestContext::default();
    assert!(harness.limiter.check(&anonymous).allowed);
    assert!(harness.limiter.check(&anonymous).allowed);

    let denied = harness.limiter.check(&anonymous);
    assert!(!denied.allowed);
    assert_eq!(denied.key, UNKNOWN_KEY);
}

// ============================================================================
// Shared quota across surfaces
// ============================================================================

#[tokio::test]
async fn test_http_checks_and_connection_events_share_one_quota() {
    let harness = TestHarness::new(Duration::from_millis(60_000), 2);
    let (conn, mut rx) = harness.connect("c1", "203.0.113.7");

    // Two HTTP requests from the address consume the whole window.
    assert!(harness.limiter.check(&ctx("203.0.113.7")).allowed);
    assert!(harness.limiter.check(&ctx("203.0.113.7")).allowed);

    // The connection event from the same address is denied by the gate.
    assert!(harness.gate.intercept(&conn).await.is_err());

    match rx.recv().await {
        Some(hackboard_gateway::ServerFrame::Error { error }) => {
            assert_eq!(error.code, "RATE_LIMIT_EXCEEDED");
        }
        other => panic!("expected error frame, got {other:?}"),
    }
}
