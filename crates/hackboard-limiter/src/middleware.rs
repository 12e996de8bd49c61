//! HTTP rate limiting middleware
//!
//! Wraps routes with the shared [`RateLimiter`]: every response carries the
//! `RateLimit-*` headers (plus the legacy `X-RateLimit-*` trio), denials get a
//! 429 with `Retry-After` and a structured body, and completed responses feed
//! the post-completion refund hook.

use crate::context::RequestContext;
use crate::limiter::{RateLimitDecision, RateLimiter};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use hackboard_common::{AppError, ErrorResponse};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;

/// Header carrying the verified project identity, set by the auth
/// collaborator upstream of this layer.
pub const PROJECT_ID_HEADER: &str = "x-project-id";

/// Denial body sent with 429 responses.
#[derive(Debug, Serialize)]
struct DenialBody {
    success: bool,
    error: ErrorResponse,
}

impl DenialBody {
    fn from_decision(decision: &RateLimitDecision) -> Self {
        Self {
            success: false,
            error: ErrorResponse::new(
                &AppError::RateLimitExceeded,
                format!(
                    "Too many requests, retry in {} seconds",
                    decision.retry_after_secs
                ),
            )
            .with_details(json!({
                "limit": decision.limit,
                "windowMs": decision.window_ms,
                "retryAfter": decision.retry_after_secs,
            })),
        }
    }
}

/// Axum middleware enforcing the shared limiter on HTTP routes.
///
/// Register with `axum::middleware::from_fn_with_state(limiter, rate_limit_middleware)`
/// on a router served via `into_make_service_with_connect_info::<SocketAddr>()`.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let ctx = context_from_request(&request);
    let decision = limiter.check(&ctx);

    if !decision.allowed {
        tracing::debug!(
            key = %decision.key,
            path = ctx.path.as_deref().unwrap_or("-"),
            "HTTP request rate limited"
        );
        return denial_response(&decision);
    }

    let key = decision.key.clone();
    let mut response = next.run(request).await;

    // Post-completion hook: refund the attempt based on how the response
    // actually finished, instead of intercepting the send path.
    let status = response.status();
    let refund = (limiter.skips_successful() && status.is_success())
        || (limiter.skips_failed() && (status.is_client_error() || status.is_server_error()));
    if refund {
        limiter.record_outcome(&key, 1);
    }

    apply_rate_limit_headers(&mut response, &decision);
    response
}

/// Derive the limiter context from request metadata.
fn context_from_request(request: &Request) -> RequestContext {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let project_id = request
        .headers()
        .get(PROJECT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    RequestContext {
        remote_addr,
        project_id,
        path: Some(request.uri().path().to_string()),
    }
}

/// Build the 429 response for a denied attempt.
fn denial_response(decision: &RateLimitDecision) -> Response {
    let body = DenialBody::from_decision(decision);
    let status = StatusCode::from_u16(AppError::RateLimitExceeded.status_code())
        .unwrap_or(StatusCode::TOO_MANY_REQUESTS);
    let mut response = (status, Json(body)).into_response();

    apply_rate_limit_headers(&mut response, decision);
    insert_header(
        &mut response,
        "retry-after",
        decision.retry_after_secs.to_string(),
    );

    response
}

/// Attach the standard and legacy rate limit headers to a response.
fn apply_rate_limit_headers(response: &mut Response, decision: &RateLimitDecision) {
    let now_ms = Utc::now().timestamp_millis();
    let reset_in_secs = decision.seconds_until_reset(now_ms);
    let window_secs = decision.window_ms.div_ceil(1000);

    insert_header(response, "ratelimit-limit", decision.limit.to_string());
    insert_header(response, "ratelimit-remaining", decision.remaining.to_string());
    insert_header(response, "ratelimit-reset", reset_in_secs.to_string());
    insert_header(
        response,
        "ratelimit-policy",
        format!("{};w={}", decision.limit, window_secs),
    );

    // Legacy names, kept for clients that predate the standard draft.
    insert_header(response, "x-ratelimit-limit", decision.limit.to_string());
    insert_header(response, "x-ratelimit-remaining", decision.remaining.to_string());
    insert_header(
        response,
        "x-ratelimit-reset",
        decision.reset_at_secs().to_string(),
    );
}

fn insert_header(response: &mut Response, name: &'static str, value: String) {
    if let Ok(value) = HeaderValue::from_str(&value) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(name), value);
    }
}
