use crate::core_types::{ChatMessage, GenerationOptions, LLMResponse};
use crate::errors::StargazeError;
use crate::llm::LLM;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use stargaze_types::ResponseMetadata;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl OpenAIClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: "https://api.openai.com/v1".to_string(),
            model,
        }
    }

    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn build_request_body(&self, messages: &[ChatMessage], options: GenerationOptions) -> Value {
        let formatted: Vec<Value> = messages
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role.as_str(),
                    "content": msg.content
                })
            })
            .collect();

        json!({
            "model": self.model,
            "messages": formatted,
            "max_tokens": options.max_tokens,
            "temperature": options.temperature,
            "n": 1
        })
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    created: Option<i64>,
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[async_trait]
impl LLM for OpenAIClient {
    async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        options: GenerationOptions,
    ) -> Result<LLMResponse, StargazeError> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request_body(&messages, options);

        log::debug!("OpenAI API request to {} with {} messages", url, messages.len());

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| StargazeError::LLMError(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| StargazeError::LLMError(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            log::error!("Error in OpenAI chat completion ({}): {}", status, response_text);
            return Err(StargazeError::LLMError(format!(
                "OpenAI API error ({}): {}",
                status, response_text
            )));
        }

        let parsed: CompletionResponse = serde_json::from_str(&response_text).map_err(|e| {
            StargazeError::ParsingError(format!("Failed to parse OpenAI response: {}", e))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| StargazeError::LLMError("OpenAI returned no choices".to_string()))?;

        let metadata = ResponseMetadata {
            model: parsed.model.or_else(|| Some(self.model.clone())),
            created_at: parsed
                .created
                .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
                .map(|ts| ts.to_rfc3339()),
            total_duration: Some(started.elapsed().as_nanos() as u64),
            prompt_eval_count: parsed.usage.as_ref().map(|u| u.prompt_tokens),
            eval_count: parsed.usage.as_ref().map(|u| u.completion_tokens),
        };

        Ok(LLMResponse {
            content: content.trim().to_string(),
            metadata,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_parses_completion() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(mockito::Matcher::PartialJson(json!({
                "model": "gpt-3.5-turbo-16k",
                "max_tokens": 1000,
                "n": 1
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": "chatcmpl-1",
                    "object": "chat.completion",
                    "created": 1714557600,
                    "model": "gpt-3.5-turbo-16k-0613",
                    "choices": [{
                        "index": 0,
                        "message": {"role": "assistant", "content": "  Try timescale/pgai.  "},
                        "finish_reason": "stop"
                    }],
                    "usage": {"prompt_tokens": 90, "completion_tokens": 12, "total_tokens": 102}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = OpenAIClient::new("sk-test".to_string(), "gpt-3.5-turbo-16k".to_string())
            .with_api_base(server.url());
        let response = client
            .generate(
                vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
                GenerationOptions::default(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "Try timescale/pgai.");
        assert_eq!(
            response.metadata.model.as_deref(),
            Some("gpt-3.5-turbo-16k-0613")
        );
        assert_eq!(response.metadata.prompt_eval_count, Some(90));
        assert_eq!(response.metadata.eval_count, Some(12));
        assert!(response.metadata.created_at.unwrap().starts_with("2024-05-01"));
        assert!(response.metadata.total_duration.is_some());
    }

    #[tokio::test]
    async fn test_generate_surfaces_http_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error": {"message": "bad key"}}"#)
            .create_async()
            .await;

        let client = OpenAIClient::new("sk-bad".to_string(), "gpt-4o-mini".to_string())
            .with_api_base(server.url());
        let err = client
            .generate(vec![ChatMessage::user("hi")], GenerationOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, StargazeError::LLMError(ref msg) if msg.contains("401")));
    }
}
