//! # HTTP Server
//!
//! Combines the health and storage routers behind the shared middleware stack.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::observability_routes::health_routes;
use super::storage_routes::{storage_routes, StateError, StorageState};
use crate::config::StoreConfig;

/// HTTP server for hashvault
pub struct HttpServer {
    config: StoreConfig,
    router: Router,
}

impl HttpServer {
    /// Open storage and database from `config` and build the server
    pub fn open(config: StoreConfig) -> Result<Self, StateError> {
        let state = Arc::new(StorageState::open(&config)?);
        Ok(Self::with_state(config, state))
    }

    /// Build the server around an already-open state
    pub fn with_state(config: StoreConfig, state: Arc<StorageState>) -> Self {
        let router = Self::build_router(&config, state);
        Self { config, router }
    }

    fn build_router(config: &StoreConfig, state: Arc<StorageState>) -> Router {
        let router = Router::new()
            .merge(health_routes())
            .merge(storage_routes(state))
            .layer(DefaultBodyLimit::max(config.max_upload_bytes))
            .layer(TraceLayer::new_for_http());

        if config.cors_origins.is_empty() {
            return router;
        }

        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|s| match s.parse() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    warn!(origin = %s, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        router.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any),
        )
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until ctrl-c
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        info!(
            %addr,
            storage_dir = %self.config.storage_dir().display(),
            database = %self.config.database_path().display(),
            "Storage startup"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
