//! Map click collector.
//!
//! Records geolocation samples posted by the map page (and opaque device
//! uploads) into append-only JSON-lines files and hands them back for plotting.
//!
//! Run the server with
//! ```not_rust
//! cargo run
//! ```
//!
//! then open http://localhost:5000 to load the page from `STATIC_DIR`.

mod config;
mod handlers;
mod models;
mod routes;
mod store;

use std::sync::Arc;
use axum::Server;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::{ServiceConfig, DEFAULT_LOG_FILTER};
use crate::handlers::AppState;
use crate::store::device_log::DeviceLog;
use crate::store::record_store::FileRecordStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::init();
    let samples = FileRecordStore::open(&config.points_file, config.append_queue).await?;
    let devices = DeviceLog::open(&config.device_file, config.append_queue).await?;
    info!("samples in {}, device payloads in {}", config.points_file.display(), config.device_file.display());

    let app = routes::router(
        AppState::new(Arc::new(samples), Arc::new(devices)),
        &config.static_dir,
    );

    let addr = config.addr()?;
    info!("listening on {}", addr);
    Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("unable to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
