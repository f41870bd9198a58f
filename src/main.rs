//! CrimeWatch - Crime Alert Notification Service
//!
//! Ingests crime-detection events, fans out notifications to registered
//! recipients, and keeps a bounded in-memory alert log for the dashboard.

mod alerts;
mod config;
mod db;
mod notify;
mod taxonomy;
mod web;

use alerts::AlertLog;
use config::ServerConfig;
use db::Store;
use notify::HttpTransport;
use web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("crimewatch=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting CrimeWatch on port {}...", cfg.http_port);
    tracing::info!("Using user store at {}", cfg.db_path);

    // Initialize user store
    let store = Arc::new(Store::new(&cfg.db_path)?);
    tracing::info!("User store initialized successfully");

    if cfg.email_service_id.is_empty() {
        tracing::warn!("Messaging provider credentials are not configured; dispatches will fail");
    }

    // Alert log and messaging transport
    let alerts = Arc::new(AlertLog::new());
    let transport = Arc::new(HttpTransport::from_config(&cfg)?);

    // Start web server
    let server = Server::new(cfg, store, alerts, transport);
    server.start().await?;

    Ok(())
}
