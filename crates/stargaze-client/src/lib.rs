//! Terminal chat client for the Stargaze server
//!
//! The widget owns a local transcript and an input buffer and performs one
//! `POST /chat` per send. The server's transcript is authoritative: after a
//! successful send it replaces the local one wholesale. Transports sit behind
//! [`ChatTransport`] so the widget can be driven without a network.

use anyhow::{bail, Result};
use async_trait::async_trait;
use stargaze_types::{ChatRequest, ChatResponse};
use std::time::Duration;

pub mod page;
pub mod render;
pub mod widget;

pub use page::ChatPage;
pub use widget::{ChatWidget, WidgetState, ERROR_REPLY};

/// Default chat endpoint base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Sends one chat turn to a backend.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

/// HTTP transport for a remote Stargaze server
pub struct HttpChatTransport {
    base_url: String,
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpChatTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: None,
        }
    }

    /// Bound each request. Without a timeout a hung server keeps the send pending.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health_check(&self) -> Result<()> {
        let health_url = format!("{}/health", self.base_url);
        let mut request = self.client.get(&health_url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            bail!("Health check failed: {}", response.status());
        }

        Ok(())
    }
}

impl Default for HttpChatTransport {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let chat_url = format!("{}/chat", self.base_url);

        let mut builder = self
            .client
            .post(&chat_url)
            .header("Content-Type", "application/json")
            .json(request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            bail!("Chat request failed: {}", response.status());
        }

        Ok(response.json::<ChatResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use stargaze_types::Message;

    #[tokio::test]
    async fn test_posts_message_and_parses_history() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"message": "hello"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "response": "Hi",
                    "chat_history": [{"user": "hello"}, {"assistant": "Hi"}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let transport = HttpChatTransport::new(format!("{}/", server.url()));
        let response = transport.send_chat(&ChatRequest::new("hello")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            response.chat_history,
            vec![Message::user("hello"), Message::assistant("Hi")]
        );
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat")
            .with_status(500)
            .with_body(r#"{"detail": "boom"}"#)
            .create_async()
            .await;

        let transport = HttpChatTransport::new(server.url());
        let err = transport
            .send_chat(&ChatRequest::new("hello"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
