//! Hackboard Gateway entry point
//!
//! Run with:
//! ```bash
//! cargo run -p hackboard-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use hackboard_common::config::Environment;
use hackboard_common::{AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Gateway failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Config first: the tracing profile depends on the environment.
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?;

    let tracing_config = match config.app.env {
        Environment::Production => TracingConfig::production(),
        Environment::Development => TracingConfig::development(),
        Environment::Staging => TracingConfig::default(),
    };
    if let Err(e) = tracing_config.try_init() {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!("Starting Hackboard Gateway...");
    info!(
        env = ?config.app.env,
        port = config.server.port,
        "Configuration loaded"
    );

    // Run the gateway server
    hackboard_gateway::server::run(config).await?;

    Ok(())
}
