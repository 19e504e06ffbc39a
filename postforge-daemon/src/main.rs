//! Postforge Daemon
//!
//! Background service that exposes the LinkedIn tools over a local
//! JSON-RPC socket.
//!
//! # Running
//!
//! ```bash
//! POSTFORGE_PERSONAL_TOKEN=... cargo run -p postforge-daemon
//! # or after install:
//! postforged
//! ```

use anyhow::Result;
use postforge_daemon::{ApiState, DaemonConfig, load_config, start_server};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    init_logging(&config.log_level);

    info!("Starting Postforge daemon...");
    info!("Loaded configuration from {:?}", config.config_path);

    run_daemon(config).await
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run_daemon(config: DaemonConfig) -> Result<()> {
    info!(
        "Daemon starting on {:?} (LinkedIn-Version {}, secrets from {:?})",
        config.socket_path, config.api_version, config.secret_backend
    );

    let state = ApiState::new(&config)?;

    let server_handle = start_server(&config.socket_path, state).await?;

    info!("Daemon running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping server...");

    server_handle.stop().await?;
    server_handle.stopped().await;

    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
        info!("Socket file removed");
    }

    info!("Daemon stopped");
    Ok(())
}
