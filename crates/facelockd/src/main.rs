use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

mod config;
mod dbus_interface;
mod engine;

use config::{Config, BUS_NAME, OBJECT_PATH};
use dbus_interface::FaceLockService;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("facelockd starting");

    let config = Config::from_env();
    let engine = engine::spawn_engine(config.scoring(), config.frame_queue)
        .context("failed to start engine")?;

    let session_bus = config.session_bus;
    let service = FaceLockService::new(config, engine);

    let builder = if session_bus {
        zbus::connection::Builder::session()?
    } else {
        zbus::connection::Builder::system()?
    };
    let _conn = builder
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, service)?
        .build()
        .await
        .context("failed to register on D-Bus")?;

    tracing::info!(
        bus = if session_bus { "session" } else { "system" },
        name = BUS_NAME,
        "facelockd ready"
    );

    // Keep running until signaled
    tokio::signal::ctrl_c().await?;
    tracing::info!("facelockd shutting down");

    Ok(())
}
