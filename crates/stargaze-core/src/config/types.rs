//! Configuration type definitions
//!
//! Every section has defaults so an empty YAML document (or no file at all) is
//! a valid configuration; deployments normally only set secrets through the
//! environment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::StargazeError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StargazeConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub environment: EnvironmentConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Allowed CORS origins; `None` allows any origin.
    #[serde(default)]
    pub cors_origins: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub enable_logging: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cors_origins: None,
            enable_logging: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection URL. Without one the in-memory store is used.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Dimension of the `vector` column; must match the embedding model.
    /// Unset means the provider's default, see [`ProviderKind::default_embedding_dimension`].
    #[serde(default)]
    pub embedding_dimension: Option<usize>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            embedding_dimension: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    #[default]
    Ollama,
}

impl ProviderKind {
    /// Output size of the provider's default embedding model.
    pub fn default_embedding_dimension(self) -> usize {
        match self {
            // text-embedding-3-small
            ProviderKind::OpenAI => 1536,
            // nomic-embed-text
            ProviderKind::Ollama => 768,
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = StargazeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAI),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(StargazeError::ConfigError(format!(
                "Unsupported AI provider: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub openai: OpenAIConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            openai: OpenAIConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAIConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_openai_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_openai_embedding_model")]
    pub embedding_model: String,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            chat_model: default_openai_chat_model(),
            embedding_model: default_openai_embedding_model(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,
    #[serde(default = "default_ollama_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_ollama_embed_model")]
    pub embed_model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            chat_model: default_ollama_chat_model(),
            embed_model: default_ollama_embed_model(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubConfig {
    #[serde(default = "default_github_api_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_github_api_url(),
            token: None,
            per_page: default_per_page(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// Settings of the sign-in layer that projects sessions for the chat page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Log every callback's input and output at debug level.
    #[serde(default)]
    pub debug_callbacks: bool,
    #[serde(default)]
    pub github_id: Option<String>,
    #[serde(default)]
    pub github_secret: Option<String>,
    #[serde(default = "default_callback_url")]
    pub callback_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            debug_callbacks: false,
            github_id: None,
            github_secret: None,
            callback_url: default_callback_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// `.env`-style files read before environment overrides are applied.
    #[serde(default = "default_env_files")]
    pub env_files: Vec<PathBuf>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            env_files: default_env_files(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_connections() -> u32 {
    5
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.1
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_chat_model() -> String {
    "gpt-3.5-turbo-16k".to_string()
}

fn default_openai_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_chat_model() -> String {
    "llama3".to_string()
}

fn default_ollama_embed_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_per_page() -> u32 {
    100
}

fn default_top_k() -> usize {
    5
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_callback_url() -> String {
    "http://localhost:3000/api/auth/callback/github".to_string()
}

fn default_env_files() -> Vec<PathBuf> {
    vec![PathBuf::from(".env")]
}

impl StargazeConfig {
    /// Override configuration values from environment-style variables.
    ///
    /// `lookup` returns the value of a variable, or `None` when unset. Empty
    /// values are treated as unset.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F) -> Result<(), StargazeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("DB_CONNECTION") {
            self.database.url = Some(url);
        }
        if let Some(provider) = get("AI_PROVIDER") {
            self.ai.provider = provider.parse()?;
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.ai.openai.api_key = Some(key);
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.ai.openai.base_url = url;
        }
        if let Some(host) = get("OLLAMA_HOST") {
            self.ai.ollama.base_url = host;
        }
        if let Some(model) = get("OLLAMA_CHAT_MODEL") {
            self.ai.ollama.chat_model = model;
        }
        if let Some(model) = get("OLLAMA_EMBED_MODEL") {
            self.ai.ollama.embed_model = model;
        }
        if let Some(url) = get("GITHUB_API_URL") {
            self.github.api_base_url = url;
        }
        if let Some(token) = get("GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
        if let Some(id) = get("GITHUB_ID") {
            self.auth.github_id = Some(id);
        }
        if let Some(secret) = get("GITHUB_SECRET") {
            self.auth.github_secret = Some(secret);
        }
        if let Some(dimension) = get("EMBEDDING_DIMENSION") {
            let dimension = dimension.trim().parse().map_err(|_| {
                StargazeError::ConfigError(format!("Invalid EMBEDDING_DIMENSION: {}", dimension))
            })?;
            self.database.embedding_dimension = Some(dimension);
        }
        if let Some(flag) = get("STARGAZE_AUTH_DEBUG") {
            self.auth.debug_callbacks = matches!(
                flag.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        Ok(())
    }

    /// Embedding dimension in effect: the configured value, else the
    /// selected provider's default.
    pub fn embedding_dimension(&self) -> usize {
        self.database
            .embedding_dimension
            .unwrap_or_else(|| self.ai.provider.default_embedding_dimension())
    }

    pub fn validate(&self) -> Result<(), StargazeError> {
        if self.ai.provider == ProviderKind::OpenAI
            && self.ai.openai.api_key.as_deref().map_or(true, str::is_empty)
        {
            return Err(StargazeError::ConfigError(
                "OpenAI provider requires an API key (OPENAI_API_KEY)".to_string(),
            ));
        }

        if self.github.per_page == 0 || self.github.per_page > 100 {
            return Err(StargazeError::ConfigError(format!(
                "GitHub per_page must be between 1 and 100, got {}",
                self.github.per_page
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(StargazeError::ConfigError(
                "Retrieval top_k must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.chunk_size == 0 {
            return Err(StargazeError::ConfigError(
                "Retrieval chunk size must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            return Err(StargazeError::ConfigError(
                "Retrieval chunk overlap must be smaller than chunk size".to_string(),
            ));
        }

        if self.embedding_dimension() == 0 {
            return Err(StargazeError::ConfigError(
                "Embedding dimension must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
