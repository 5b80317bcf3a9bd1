//! Chat turns over the retriever with a process-wide transcript.

use crate::errors::StargazeError;
use crate::retrieval::Retriever;
use stargaze_types::{ChatResponse, Message};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Runs chat turns and keeps the transcript shared by every client.
#[derive(Clone)]
pub struct ChatService {
    retriever: Arc<Retriever>,
    history: Arc<RwLock<Vec<Message>>>,
}

impl ChatService {
    pub fn new(retriever: Retriever) -> Self {
        Self {
            retriever: Arc::new(retriever),
            history: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Answer `message` and append the user and assistant entries.
    ///
    /// Both entries are appended together once the answer is ready, so
    /// concurrent turns never interleave. A failed turn leaves the
    /// transcript untouched.
    pub async fn chat(
        &self,
        message: &str,
        format_only: bool,
    ) -> Result<ChatResponse, StargazeError> {
        if message.trim().is_empty() {
            return Err(StargazeError::ValidationError(
                "No message provided".to_string(),
            ));
        }

        let answer = self
            .retriever
            .generate_response(message, format_only)
            .await?;

        let assistant = match answer.metadata {
            Some(metadata) => Message::assistant_with_metadata(answer.text.clone(), metadata),
            None => Message::assistant(answer.text.clone()),
        };

        let mut history = self.history.write().await;
        history.push(Message::user(message));
        history.push(assistant);

        Ok(ChatResponse {
            response: answer.text,
            chat_history: history.clone(),
        })
    }

    pub async fn history(&self) -> Vec<Message> {
        self.history.read().await.clone()
    }

    pub async fn clear(&self) {
        self.history.write().await.clear();
    }
}
