//! HTTP and websocket front end for Stargaze
//!
//! Exposes the chat service and the stars ingestion pipeline over a small
//! JSON API. Chat turns share one process-wide transcript; ingestion can run
//! either as a single request (`POST /ingest`) or over a websocket that
//! reports progress per repository (`GET /ws`).

pub mod error;
pub mod ws;

pub use error::{Result, ServerError};

use axum::extract::{DefaultBodyLimit, Json as AxumJson, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::{middleware, Router};
use stargaze_core::config::ServerSettings;
use stargaze_core::Services;
use stargaze_types::{ChatRequest, ChatResponse, HealthResponse, IngestRequest, IngestResponse};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const INGEST_SUCCESS_MESSAGE: &str = "GitHub user stars processed successfully";

/// Configuration for the Stargaze server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Enable CORS
    pub enable_cors: bool,
    /// CORS allowed origins (if None, allows any origin)
    pub cors_origins: Option<Vec<String>>,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Enable request logging
    pub enable_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            enable_cors: true,
            cors_origins: None,
            max_body_size: 1024 * 1024, // 1MB
            enable_logging: true,
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a server configuration from the `server` section of the config file.
    pub fn from_settings(settings: &ServerSettings) -> Result<Self> {
        let config = Self::new()
            .with_bind_addr_str(&settings.bind_addr)?
            .with_logging(settings.enable_logging);
        Ok(match &settings.cors_origins {
            Some(origins) => config.with_cors_origins(origins.clone()),
            None => config,
        })
    }

    /// Set the bind address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Parse and set the bind address from a string.
    pub fn with_bind_addr_str(mut self, addr: &str) -> Result<Self> {
        self.bind_addr = addr
            .parse()
            .map_err(|e| ServerError::config_error(format!("Invalid bind address: {}", e)))?;
        Ok(self)
    }

    /// Enable or disable CORS.
    pub fn with_cors(mut self, enable: bool) -> Self {
        self.enable_cors = enable;
        self
    }

    /// Set allowed CORS origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Set maximum request body size.
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Enable or disable request logging.
    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }
}

/// Shared application state containing the services and configuration.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub config: ServerConfig,
}

/// Handler for the /chat POST endpoint.
async fn chat_handler(
    State(app_state): State<AppState>,
    AxumJson(request): AxumJson<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    log::info!("Received message: {}", request.message);

    let response = app_state
        .services
        .chat
        .chat(&request.message, request.format_only)
        .await?;

    log::info!(
        "Generated response ({} chars, {} history entries)",
        response.response.len(),
        response.chat_history.len()
    );
    Ok(Json(response))
}

/// Handler for the /ingest POST endpoint.
async fn ingest_handler(
    State(app_state): State<AppState>,
    AxumJson(request): AxumJson<IngestRequest>,
) -> Result<(StatusCode, Json<IngestResponse>)> {
    log::info!(
        "Received ingest request for GitHub user: {}",
        request.github_username
    );

    let result = app_state
        .services
        .ingestor
        .ingest(&request.github_username, &stargaze_core::NoopObserver)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            message: INGEST_SUCCESS_MESSAGE.to_string(),
            result,
        }),
    ))
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// The Stargaze HTTP server.
pub struct StargazeServer {
    services: Services,
    config: ServerConfig,
}

impl StargazeServer {
    /// Create a new server with the given services and default configuration.
    pub fn new(services: Services) -> Self {
        Self {
            services,
            config: ServerConfig::default(),
        }
    }

    /// Create a new server with custom configuration.
    pub fn with_config(services: Services, config: ServerConfig) -> Self {
        Self { services, config }
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the Axum router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let state = AppState {
            services: self.services.clone(),
            config: self.config.clone(),
        };

        let mut router = Router::new()
            .route("/health", get(health_handler))
            .route("/chat", post(chat_handler))
            .route("/ingest", post(ingest_handler))
            .route("/ws", get(ws::ws_handler))
            .layer(DefaultBodyLimit::max(self.config.max_body_size))
            .with_state(state);

        if self.config.enable_logging {
            router = router.layer(middleware::from_fn(
                |request: axum::http::Request<axum::body::Body>,
                 next: axum::middleware::Next| async {
                    let request_id = uuid::Uuid::new_v4().to_string();
                    let method = request.method().clone();
                    let uri = request.uri().clone();

                    // Health probes are frequent
                    let quiet = uri.path() == "/health";
                    if quiet {
                        log::debug!("Request {} {} {}", request_id, method, uri);
                    } else {
                        log::info!("Request {} {} {}", request_id, method, uri);
                    }

                    let start = std::time::Instant::now();
                    let response = next.run(request).await;
                    let duration = start.elapsed();

                    if quiet {
                        log::debug!("Response {} completed in {:?}", request_id, duration);
                    } else {
                        log::info!(
                            "Response {} {} completed in {:?}",
                            request_id,
                            response.status(),
                            duration
                        );
                    }

                    response
                },
            ));
        }

        router = router.layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            let cors_layer = if let Some(ref origins) = self.config.cors_origins {
                let origins: std::result::Result<Vec<_>, _> =
                    origins.iter().map(|s| s.parse()).collect();
                match origins {
                    Ok(origins) => CorsLayer::new()
                        .allow_origin(origins)
                        .allow_methods(Any)
                        .allow_headers(Any),
                    Err(_) => {
                        log::warn!("Invalid CORS origin configured, allowing any origin");
                        CorsLayer::permissive()
                    }
                }
            } else {
                CorsLayer::permissive()
            };
            router = router.layer(cors_layer);
        }

        router
    }

    async fn bind(&self) -> Result<TcpListener> {
        TcpListener::bind(self.config.bind_addr)
            .await
            .map_err(|e| {
                ServerError::config_error(format!(
                    "Failed to bind to {}: {}",
                    self.config.bind_addr, e
                ))
            })
    }

    fn log_endpoints(&self) {
        let addr = self.config.bind_addr;
        log::info!("Health check: http://{}/health", addr);
        log::info!("Chat endpoint: http://{}/chat", addr);
        log::info!("Ingest endpoint: http://{}/ingest", addr);
        log::info!("WebSocket endpoint: ws://{}/ws", addr);
    }

    /// Start the server and listen for connections.
    ///
    /// This method will block until the server is shut down.
    pub async fn serve(self) -> Result<()> {
        let router = self.build_router();
        let listener = self.bind().await?;

        log::info!("Stargaze server starting on {}", self.config.bind_addr);
        self.log_endpoints();

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::internal(format!("Server error: {}", e)))
    }

    /// Start the server with graceful shutdown support.
    ///
    /// The server will shut down when the provided shutdown signal is received.
    pub async fn serve_with_shutdown<F>(self, shutdown_signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        let listener = self.bind().await?;

        log::info!(
            "Stargaze server starting on {} with graceful shutdown",
            self.config.bind_addr
        );
        self.log_endpoints();

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::internal(format!("Server error: {}", e)))?;

        log::info!("Stargaze server shut down gracefully");
        Ok(())
    }
}

/// Utility function to create a shutdown signal from Ctrl+C.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            log::info!("Received SIGTERM, shutting down...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_settings() {
        let settings = ServerSettings {
            bind_addr: "0.0.0.0:9000".to_string(),
            cors_origins: Some(vec!["http://localhost:3000".to_string()]),
            enable_logging: false,
        };
        let config = ServerConfig::from_settings(&settings).unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
        assert!(!config.enable_logging);
        assert_eq!(
            config.cors_origins,
            Some(vec!["http://localhost:3000".to_string()])
        );
    }

    #[test]
    fn test_default_matches_settings_default() {
        let from_settings = ServerConfig::from_settings(&ServerSettings::default()).unwrap();
        assert_eq!(from_settings.bind_addr, ServerConfig::default().bind_addr);
        assert_eq!(ServerConfig::default().bind_addr.to_string(), "0.0.0.0:8000");
    }

    #[test]
    fn test_invalid_bind_addr_rejected() {
        let err = ServerConfig::new().with_bind_addr_str("nowhere").unwrap_err();
        assert_eq!(err.error_type(), "config_error");
    }
}
