//! # HTTP Server
//!
//! Binds the command router, wraps it in the CORS and tracing layers and
//! closes the store topology once the listener stops.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::executor::ExecutionCoordinator;

use super::auth::AuthGate;
use super::config::HttpServerConfig;
use super::routes::{command_routes, AppState};

/// REST front end for the execution coordinator
pub struct HttpServer {
    config: HttpServerConfig,
    coordinator: Arc<ExecutionCoordinator>,
    router: Router,
}

impl HttpServer {
    pub fn new(
        config: HttpServerConfig,
        coordinator: Arc<ExecutionCoordinator>,
        auth: AuthGate,
    ) -> Self {
        if !auth.is_enabled() {
            warn!("no auth token configured, command routes are open to any caller");
        }
        let state = Arc::new(AppState {
            coordinator: Arc::clone(&coordinator),
            auth,
        });
        let router = Self::build_router(&config, state);
        Self {
            config,
            coordinator,
            router,
        }
    }

    fn build_router(config: &HttpServerConfig, state: Arc<AppState>) -> Router {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        command_routes(state)
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until Ctrl-C, then close the store topology
    pub async fn start(self) -> io::Result<()> {
        let addr: SocketAddr = self
            .config
            .socket_addr()
            .parse()
            .map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid bind address: {}", e),
                )
            })?;

        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "restkv listening");

        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        info!("closing store connections");
        self.coordinator.shutdown().await;
        served
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
