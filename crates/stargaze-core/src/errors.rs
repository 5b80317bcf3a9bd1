//! Error type shared by every Stargaze subsystem
//!
//! Errors are grouped by where they originate (model provider, GitHub, storage,
//! configuration) so callers can tell a misconfiguration from an upstream
//! outage when deciding what to report.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum StargazeError {
    #[error("LLM interaction failed: {0}")]
    LLMError(String),
    #[error("Embedding generation failed: {0}")]
    EmbeddingError(String),
    #[error("GitHub request failed: {0}")]
    GitHubError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Ingestion failed: {0}")]
    IngestError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Parsing error: {0}")]
    ParsingError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for StargazeError {
    fn from(err: std::io::Error) -> Self {
        StargazeError::IoError(err.to_string())
    }
}

impl From<reqwest::Error> for StargazeError {
    fn from(err: reqwest::Error) -> Self {
        StargazeError::LLMError(err.to_string())
    }
}

impl From<sqlx::Error> for StargazeError {
    fn from(err: sqlx::Error) -> Self {
        StargazeError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for StargazeError {
    fn from(err: serde_json::Error) -> Self {
        StargazeError::ParsingError(err.to_string())
    }
}
