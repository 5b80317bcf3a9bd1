//! Type definitions for the Stargaze chat protocol
//!
//! This crate holds the contract between the Stargaze backend and its chat
//! clients: the chat transcript entries returned by `POST /chat`, the ingestion
//! request/result/progress types used by `POST /ingest` and the `/ws`
//! websocket, and the session shape projected by the auth callbacks.
//!
//! ## Example
//!
//! ```rust
//! use stargaze_types::{AssistantContent, Message};
//!
//! let entry: Message = serde_json::from_str(r#"{"assistant": "Hi there"}"#).unwrap();
//! assert_eq!(entry, Message::Assistant(AssistantContent::Text("Hi there".to_string())));
//! assert_eq!(entry.text(), "Hi there");
//! ```

pub mod chat;
pub mod ingest;
pub mod session;

pub use chat::*;
pub use ingest::*;
pub use session::*;

use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}
