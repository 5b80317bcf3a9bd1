//! Language model provider abstractions and integrations.
//!
//! Defines the [`LLM`] trait used for chat completions and the factory that
//! pairs a chat model with an embedding generator for the configured
//! provider (OpenAI or Ollama).

pub use crate::core_types::{ChatMessage, GenerationOptions, LLMResponse, Role};
use crate::config::{AiConfig, ProviderKind};
use crate::errors::StargazeError;
use crate::rag::embeddings::{EmbeddingGenerator, RestEmbeddingClient, RestEmbeddingConfig};
use async_trait::async_trait;
use std::sync::Arc;

pub mod providers;

pub use providers::{OllamaClient, OpenAIClient};

#[async_trait]
pub trait LLM: Send + Sync {
    async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        options: GenerationOptions,
    ) -> Result<LLMResponse, StargazeError>;

    /// Model identifier, used in logs.
    fn model_name(&self) -> &str;
}

/// A chat model and an embedding generator from the same provider.
#[derive(Clone)]
pub struct ProviderSet {
    pub llm: Arc<dyn LLM>,
    pub embeddings: Arc<dyn EmbeddingGenerator>,
}

/// Builds provider clients from configuration
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn from_config(
        config: &AiConfig,
        embedding_dimension: usize,
    ) -> Result<ProviderSet, StargazeError> {
        match config.provider {
            ProviderKind::OpenAI => {
                let api_key = config
                    .openai
                    .api_key
                    .clone()
                    .filter(|key| !key.is_empty())
                    .ok_or_else(|| {
                        StargazeError::ConfigError(
                            "OpenAI provider requires these parameters: [api_key]".to_string(),
                        )
                    })?;

                let llm = OpenAIClient::new(api_key.clone(), config.openai.chat_model.clone())
                    .with_api_base(config.openai.base_url.clone());

                let embeddings = RestEmbeddingClient::new(RestEmbeddingConfig {
                    api_base_url: config.openai.base_url.trim_end_matches('/').to_string(),
                    api_key: Some(api_key),
                    model_name: config.openai.embedding_model.clone(),
                    embedding_dimension,
                    request_dimensions: config
                        .openai
                        .embedding_model
                        .starts_with("text-embedding-3"),
                    ..Default::default()
                })?;

                log::info!(
                    "Initialized OpenAI provider (chat: {}, embeddings: {})",
                    config.openai.chat_model,
                    config.openai.embedding_model
                );

                Ok(ProviderSet {
                    llm: Arc::new(llm),
                    embeddings: Arc::new(embeddings),
                })
            }
            ProviderKind::Ollama => {
                let client = OllamaClient::new(
                    config.ollama.base_url.clone(),
                    config.ollama.chat_model.clone(),
                    config.ollama.embed_model.clone(),
                )
                .with_embedding_dimension(embedding_dimension);

                log::info!(
                    "Initialized Ollama provider with embedding model {} and chat model {}",
                    config.ollama.embed_model,
                    config.ollama.chat_model
                );

                let client = Arc::new(client);
                Ok(ProviderSet {
                    llm: client.clone(),
                    embeddings: client,
                })
            }
        }
    }
}
