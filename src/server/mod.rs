//! HTTP server module.
//!
//! This module provides:
//! - Shared application state management
//! - Router construction and request handlers
//! - CORS and graceful shutdown wiring

mod routes;

pub use routes::*;

use std::sync::Arc;

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::analysis::AnalysisOrchestrator;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::history::HistoryService;
use crate::storage::ReviewStore;

/// Application state shared across handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Review store backend.
    pub store: Arc<dyn ReviewStore>,
    /// Analysis pipeline over the two analyzers.
    pub orchestrator: AnalysisOrchestrator,
    /// Query service for listing, lookup, and deletion.
    pub history: HistoryService,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: Config,
        store: Arc<dyn ReviewStore>,
        orchestrator: AnalysisOrchestrator,
    ) -> Self {
        let history = HistoryService::new(Arc::clone(&store));
        Self {
            config,
            store,
            orchestrator,
            history,
        }
    }
}

/// Shared application state handle
pub type SharedState = Arc<AppState>;

/// Build the CORS layer from the configured allowed origins.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Bind and serve the HTTP API until ctrl-c.
pub async fn serve(state: SharedState) -> AppResult<()> {
    let addr = format!(
        "{}:{}",
        state.config.server.host, state.config.server.port
    );
    let cors = cors_layer(&state.config.server.allowed_origins);

    let app = api_router().layer(cors).with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Server {
            message: format!("Failed to bind to {}: {}", addr, e),
        })?;

    let local_addr = listener.local_addr().map_err(|e| AppError::Server {
        message: format!("Failed to read local address: {}", e),
    })?;
    info!(addr = %local_addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Server {
            message: format!("Server error: {}", e),
        })?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("Failed to install ctrl-c handler; running until killed");
        std::future::pending::<()>().await;
    }
}
