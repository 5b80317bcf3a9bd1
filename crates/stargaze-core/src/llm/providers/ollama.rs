use crate::core_types::{ChatMessage, GenerationOptions, LLMResponse};
use crate::errors::StargazeError;
use crate::llm::LLM;
use crate::rag::embeddings::EmbeddingGenerator;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use stargaze_types::ResponseMetadata;

/// Client for a local Ollama server, used for both chat and embeddings.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    chat_model: String,
    embed_model: String,
    embedding_dimension: usize,
}

impl OllamaClient {
    pub fn new(base_url: String, chat_model: String, embed_model: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            chat_model,
            embed_model,
            embedding_dimension: 768,
        }
    }

    pub fn with_embedding_dimension(mut self, dimension: usize) -> Self {
        self.embedding_dimension = dimension;
        self
    }

    pub fn embed_model(&self) -> &str {
        &self.embed_model
    }

    fn format_messages(messages: &[ChatMessage]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| json!({ "role": msg.role.as_str(), "content": msg.content }))
            .collect()
    }

    /// Extract the reply text and metadata from an `/api/chat` body.
    fn parse_chat_response(body: &Value) -> Result<LLMResponse, StargazeError> {
        let message = body.get("message").ok_or_else(|| {
            log::error!("Unexpected Ollama response structure: {}", body);
            StargazeError::LLMError("Invalid response structure from Ollama".to_string())
        })?;

        let mut content = message
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if content.is_empty() {
            content = body
                .get("content")
                .and_then(Value::as_str)
                .unwrap_or_default();
        }

        let metadata = ResponseMetadata {
            model: body.get("model").and_then(Value::as_str).map(String::from),
            created_at: body
                .get("created_at")
                .and_then(Value::as_str)
                .map(String::from),
            total_duration: body.get("total_duration").and_then(Value::as_u64),
            prompt_eval_count: body.get("prompt_eval_count").and_then(Value::as_u64),
            eval_count: body.get("eval_count").and_then(Value::as_u64),
        };

        Ok(LLMResponse {
            content: content.trim().to_string(),
            metadata,
        })
    }
}

#[async_trait]
impl LLM for OllamaClient {
    async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        options: GenerationOptions,
    ) -> Result<LLMResponse, StargazeError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = json!({
            "model": self.chat_model,
            "messages": Self::format_messages(&messages),
            "stream": false,
            "options": {
                "temperature": options.temperature,
                "num_predict": options.max_tokens
            }
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| StargazeError::LLMError(format!("Ollama request failed: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| StargazeError::LLMError(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            log::error!("Error in Ollama chat completion ({}): {}", status, response_text);
            return Err(StargazeError::LLMError(format!(
                "Ollama API error ({}): {}",
                status, response_text
            )));
        }

        let parsed: Value = serde_json::from_str(&response_text).map_err(|e| {
            StargazeError::ParsingError(format!("Failed to parse Ollama response: {}", e))
        })?;
        log::debug!("Ollama chat response: {}", parsed);

        Self::parse_chat_response(&parsed)
    }

    fn model_name(&self) -> &str {
        &self.chat_model
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingGenerator for OllamaClient {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, StargazeError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "model": self.embed_model, "prompt": text }))
            .send()
            .await
            .map_err(|e| {
                StargazeError::EmbeddingError(format!("Ollama embedding request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Error generating Ollama embeddings: {}", error_text);
            return Err(StargazeError::EmbeddingError(format!(
                "Ollama embedding error ({}): {}",
                status, error_text
            )));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            StargazeError::EmbeddingError(format!("Failed to parse Ollama embedding: {}", e))
        })?;

        Ok(parsed.embedding)
    }

    fn embedding_dimension(&self) -> usize {
        self.embedding_dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(url: String) -> OllamaClient {
        OllamaClient::new(url, "llama3".to_string(), "nomic-embed-text".to_string())
    }

    #[tokio::test]
    async fn test_chat_reads_message_content_and_metadata() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_body(mockito::Matcher::PartialJson(json!({
                "model": "llama3",
                "stream": false
            })))
            .with_status(200)
            .with_body(
                json!({
                    "model": "llama3",
                    "created_at": "2024-05-01T10:00:00Z",
                    "message": {"role": "assistant", "content": " Look at **pgai**. "},
                    "done": true,
                    "total_duration": 2_500_000_000u64,
                    "prompt_eval_count": 120,
                    "eval_count": 30
                })
                .to_string(),
            )
            .create_async()
            .await;

        let response = client_for(server.url())
            .generate(vec![ChatMessage::user("vector dbs?")], GenerationOptions::default())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "Look at **pgai**.");
        assert_eq!(response.metadata.model.as_deref(), Some("llama3"));
        assert_eq!(response.metadata.total_duration, Some(2_500_000_000));
        assert_eq!(response.metadata.total_tokens(), Some(150));
    }

    #[test]
    fn test_falls_back_to_top_level_content() {
        let body = json!({"message": {"content": ""}, "content": "fallback"});
        let response = OllamaClient::parse_chat_response(&body).unwrap();
        assert_eq!(response.content, "fallback");
    }

    #[test]
    fn test_missing_message_is_an_error() {
        let err = OllamaClient::parse_chat_response(&json!({"done": true})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "LLM interaction failed: Invalid response structure from Ollama"
        );
    }

    #[tokio::test]
    async fn test_embeddings_one_request_per_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/embeddings")
            .match_body(mockito::Matcher::PartialJson(
                json!({"model": "nomic-embed-text"}),
            ))
            .with_status(200)
            .with_body(r#"{"embedding": [0.1, 0.2, 0.3]}"#)
            .expect(2)
            .create_async()
            .await;

        let client = client_for(server.url()).with_embedding_dimension(3);
        let embeddings = client
            .generate_embeddings(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0], vec![0.1, 0.2, 0.3]);
        assert_eq!(client.embedding_dimension(), 3);
    }
}
