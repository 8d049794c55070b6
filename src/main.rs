//! drop-relay binary entry point.
//!
//! Usage:
//! ```bash
//! drop-relay --config drop-relay.toml
//! ```

use drop_relay::clock::SystemClock;
use drop_relay::config::Config;
use drop_relay::http::build_router;
use drop_relay::keyserver::VksKeyserver;
use drop_relay::server::RelayService;
use drop_relay::storage::SqliteStorage;
use drop_relay::sweeper::spawn_sweeper;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = get_config_path();
    let config = if config_path.exists() {
        tracing::info!("Loading configuration from {:?}", config_path);
        Config::from_file(&config_path)?
    } else {
        tracing::info!("No config file at {:?}, using defaults", config_path);
        Config::default()
    };

    let clock = Arc::new(SystemClock);
    let storage = Arc::new(SqliteStorage::new(&config.storage.database, clock.clone()).await?);
    tracing::info!("Database ready at {:?}", config.storage.database);

    let keyserver = Arc::new(VksKeyserver::new(&config.keyserver)?);

    let bind_address = config.server.bind_address.clone();
    let retention = config.retention.clone();
    let relay = Arc::new(RelayService::new(config, storage, keyserver, clock.clone()));

    let sweeper = spawn_sweeper(relay.storage_arc(), clock, retention);

    let app = build_router(relay);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("drop-relay v{} listening on {}", env!("CARGO_PKG_VERSION"), bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    } else {
        tracing::info!("Shutdown signal received");
    }
}

fn get_config_path() -> PathBuf {
    std::env::args()
        .skip_while(|arg| arg != "--config")
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("drop-relay.toml"))
}
