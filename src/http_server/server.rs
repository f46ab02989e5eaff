//! # HTTP Server
//!
//! Combines the survey, study and observability routers into one axum app.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use super::config::HttpServerConfig;
use super::observability_routes::{health_routes, observability_routes};
use super::state::ApiState;
use super::study_routes::study_routes;
use super::survey_routes::survey_routes;
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::store::SurveyStore;

/// HTTP server for the survey API
pub struct HttpServer {
    config: HttpServerConfig,
    state: Arc<ApiState>,
    router: Router,
}

impl HttpServer {
    /// Create a server over an opened store
    pub fn with_config(config: HttpServerConfig, store: SurveyStore) -> Self {
        let state = Arc::new(ApiState::new(store, &config));
        let router = Self::build_router(&config, Arc::clone(&state));
        Self { config, state, router }
    }

    /// Build the combined router with all endpoints
    fn build_router(config: &HttpServerConfig, state: Arc<ApiState>) -> Router {
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

        let metrics = Arc::clone(&state.metrics);
        Router::new()
            .merge(health_routes())
            .nest("/observability", observability_routes(metrics))
            .nest(
                "/api",
                survey_routes(Arc::clone(&state)).merge(study_routes(state)),
            )
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    pub fn metrics(&self) -> Arc<MetricsRegistry> {
        Arc::clone(&self.state.metrics)
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serves until ctrl-c or SIGTERM, then closes the store.
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address '{}': {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        let bound = addr.to_string();
        log_event_with_fields(Event::Serving, &[("addr", bound.as_str())]);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Err(err) = self.state.store.close().await {
            error!(error = %err, "closing store failed");
        }
        log_event_with_fields(Event::ShutdownComplete, &[]);

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                error!(error = %err, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log_event_with_fields(Event::ShutdownStart, &[]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;

    fn store() -> SurveyStore {
        SurveyStore::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn test_server_with_custom_port() {
        let config = HttpServerConfig::with_port(8080);
        let server = HttpServer::with_config(config, store());
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_router_builds_with_origin_list() {
        let config = HttpServerConfig {
            cors_origins: vec!["http://localhost:5173".to_string()],
            ..Default::default()
        };
        let _router = HttpServer::with_config(config, store()).router();
    }
}
