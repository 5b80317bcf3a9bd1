use crate::errors::StargazeError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

#[async_trait]
pub trait EmbeddingGenerator: Send + Sync {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, StargazeError>;

    async fn generate_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, StargazeError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            let embedding = self.generate_embedding(text).await?;
            embeddings.push(embedding);
        }
        Ok(embeddings)
    }

    fn embedding_dimension(&self) -> usize;
}

/// Deterministic hash-based embeddings for tests and offline runs.
pub struct DummyEmbeddingGenerator {
    embedding_dimension: usize,
}

impl DummyEmbeddingGenerator {
    pub fn new() -> Self {
        Self {
            embedding_dimension: 768,
        }
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            embedding_dimension: dimension,
        }
    }
}

impl Default for DummyEmbeddingGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingGenerator for DummyEmbeddingGenerator {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, StargazeError> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let hash = hasher.finish();

        let mut embedding: Vec<f32> = (0..self.embedding_dimension)
            .map(|i| {
                let seed = hash.wrapping_mul(i as u64 + 1).rotate_left(i as u32 % 64);
                ((seed % 1000) as f32 - 500.0) / 500.0
            })
            .collect();

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for val in &mut embedding {
                *val /= magnitude;
            }
        }

        Ok(embedding)
    }

    fn embedding_dimension(&self) -> usize {
        self.embedding_dimension
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

/// Settings for an OpenAI-compatible `/embeddings` endpoint.
#[derive(Debug, Clone)]
pub struct RestEmbeddingConfig {
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub model_name: String,
    pub embedding_dimension: usize,
    /// Ask the endpoint for `embedding_dimension` outputs. Only models that
    /// support shortening (OpenAI `text-embedding-3-*`) accept this.
    pub request_dimensions: bool,
    pub timeout_seconds: u64,
    pub max_batch_size: usize,
}

impl Default for RestEmbeddingConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model_name: "text-embedding-3-small".to_string(),
            embedding_dimension: 1536,
            request_dimensions: false,
            timeout_seconds: 30,
            max_batch_size: 100,
        }
    }
}

pub struct RestEmbeddingClient {
    client: Client,
    config: RestEmbeddingConfig,
}

impl RestEmbeddingClient {
    pub fn new(config: RestEmbeddingConfig) -> Result<Self, StargazeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                StargazeError::EmbeddingError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RestEmbeddingConfig {
        &self.config
    }

    async fn call_api(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, StargazeError> {
        let url = format!("{}/embeddings", self.config.api_base_url);

        let mut payload = json!({
            "model": self.config.model_name,
            "input": texts,
            "encoding_format": "float"
        });
        if self.config.request_dimensions {
            payload["dimensions"] = json!(self.config.embedding_dimension);
        }

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");
        if let Some(api_key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request.json(&payload).send().await.map_err(|e| {
            StargazeError::EmbeddingError(format!("Embedding API request failed: {}", e))
        })?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| StargazeError::EmbeddingError(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            log::error!("Embedding API error response: {}", response_text);
            return Err(StargazeError::EmbeddingError(format!(
                "Embedding API error ({}): {}",
                status, response_text
            )));
        }

        let mut response_data: EmbeddingResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                StargazeError::EmbeddingError(format!("Failed to parse embedding response: {}", e))
            })?;
        response_data.data.sort_by_key(|item| item.index);

        if response_data.data.len() != texts.len() {
            return Err(StargazeError::EmbeddingError(format!(
                "Mismatch between input texts ({}) and returned embeddings ({})",
                texts.len(),
                response_data.data.len()
            )));
        }

        Ok(response_data
            .data
            .into_iter()
            .map(|item| item.embedding)
            .collect())
    }
}

#[async_trait]
impl EmbeddingGenerator for RestEmbeddingClient {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, StargazeError> {
        let embeddings = self.generate_embeddings(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| StargazeError::EmbeddingError("No embedding returned from API".to_string()))
    }

    async fn generate_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, StargazeError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let batches: Vec<&[String]> = texts.chunks(self.config.max_batch_size.max(1)).collect();
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for (i, batch) in batches.iter().enumerate() {
            log::debug!(
                "Processing embedding batch {}/{} ({} texts)",
                i + 1,
                batches.len(),
                batch.len()
            );
            all_embeddings.extend(self.call_api(batch).await?);
        }

        log::debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn embedding_dimension(&self) -> usize {
        self.config.embedding_dimension
    }
}

#[derive(Debug, serde::Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, serde::Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}
