//! Gateway server setup
//!
//! Router construction and the server entrypoint.

mod handler;
mod state;

pub use handler::gateway_handler;
pub use state::GatewayState;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use hackboard_common::{AppConfig, AppError, AppResult};
use hackboard_limiter::middleware::rate_limit_middleware;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/ws", get(gateway_handler))
        .route("/health", get(health_check))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
///
/// The HTTP rate limit middleware shares the same limiter instance the
/// admission gate checks, so HTTP requests and connection events draw from
/// one quota per key.
pub fn create_app(state: GatewayState) -> Router {
    let limiter = Arc::clone(state.limiter());

    create_router()
        .layer(from_fn_with_state(limiter, rate_limit_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the gateway server
pub async fn run_server(app: Router, addr: SocketAddr) -> AppResult<()> {
    tracing::info!("Starting gateway server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Gateway listening on ws://{}/ws", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(AppError::internal)?;

    Ok(())
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> AppResult<()> {
    let addr: SocketAddr = config
        .server
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid bind address: {e}")))?;

    let sweep_interval = Duration::from_secs(config.rate_limit.sweep_interval_secs);

    let state =
        GatewayState::from_config(config).map_err(|e| AppError::Config(e.to_string()))?;

    // Sweeper lives as long as the server; the handle aborts it on shutdown.
    let _sweeper = state.limiter().start_sweeper(sweep_interval);

    let app = create_app(state);

    run_server(app, addr).await
}
