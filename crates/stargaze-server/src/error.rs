//! Error types for the Stargaze server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use stargaze_core::StargazeError;
use thiserror::Error;

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors that can occur in the Stargaze server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Failure reported by the chat or ingestion services
    #[error(transparent)]
    Service(#[from] StargazeError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid request format
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Server configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Create a new invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a new configuration error.
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Convert ServerError to HTTP status code
impl ServerError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::InvalidRequest(_) | ServerError::Json(_) => 400,
            ServerError::Service(StargazeError::ValidationError(_)) => 400,
            ServerError::Service(_)
            | ServerError::Io(_)
            | ServerError::Config(_)
            | ServerError::Internal(_) => 500,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ServerError::Service(err) => match err {
                StargazeError::ValidationError(_) => "invalid_request",
                StargazeError::LLMError(_) => "llm_error",
                StargazeError::EmbeddingError(_) => "embedding_error",
                StargazeError::GitHubError(_) => "github_error",
                StargazeError::StorageError(_) => "storage_error",
                StargazeError::IngestError(_) => "ingest_error",
                StargazeError::ConfigError(_) => "config_error",
                StargazeError::ParsingError(_) => "parsing_error",
                StargazeError::IoError(_) => "io_error",
            },
            ServerError::Json(_) => "json_error",
            ServerError::Io(_) => "io_error",
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::Config(_) => "config_error",
            ServerError::Internal(_) => "internal_error",
        }
    }

    /// Message for the `detail` field of an error body.
    ///
    /// Validation failures carry their message verbatim so clients can show
    /// it as is.
    pub fn detail(&self) -> String {
        match self {
            ServerError::Service(StargazeError::ValidationError(msg))
            | ServerError::InvalidRequest(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        } else {
            log::warn!("Rejected request: {}", self);
        }

        (
            status,
            Json(json!({
                "detail": self.detail(),
                "error": self.error_type(),
                "timestamp": chrono::Utc::now()
            })),
        )
            .into_response()
    }
}
