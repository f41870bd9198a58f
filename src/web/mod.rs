//! Web server module.

mod handlers;

pub use handlers::*;

use crate::alerts::AlertLog;
use crate::config::ServerConfig;
use crate::db::Store;
use crate::notify::Transport;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<Store>,
    pub alerts: Arc<AlertLog>,
    pub transport: Arc<dyn Transport>,
}

/// Web server for CrimeWatch.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a new server with the given dependencies.
    pub fn new(
        config: ServerConfig,
        store: Arc<Store>,
        alerts: Arc<AlertLog>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            state: AppState {
                config,
                store,
                alerts,
                transport,
            },
        }
    }

    /// Build the router with all routes.
    fn routes(&self) -> Router {
        let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

        Router::new()
            // Ingestion
            .route("/api/notifications", post(handlers::handle_ingest))
            // Alert log
            .route("/api/alerts", get(handlers::handle_get_alerts))
            .route("/api/alerts", delete(handlers::handle_clear_alerts))
            .route("/api/alerts/{id}", get(handlers::handle_get_alert))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB
            .with_state(self.state.clone())
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = self.routes();

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
