use crate::errors::StargazeError;
use crate::rag::embeddings::cosine_similarity;
use crate::store::{dedupe_by_repository, RepoMatch, RepositoryStore};
use async_trait::async_trait;
use stargaze_types::RepositoryInfo;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredRepository {
    id: i64,
    github_username: String,
    info: RepositoryInfo,
}

#[derive(Debug, Clone)]
struct StoredChunk {
    repository_id: i64,
    chunk_seq: usize,
    chunk: String,
    embedding: Vec<f32>,
}

#[derive(Debug, Default)]
struct Inner {
    repositories: Vec<StoredRepository>,
    chunks: Vec<StoredChunk>,
    embedding_dimension: Option<usize>,
}

/// Process-local store with brute-force cosine search.
#[derive(Debug, Default)]
pub struct InMemoryRepositoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryRepositoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn repository_count(&self) -> usize {
        self.inner.read().await.repositories.len()
    }

    pub async fn chunk_count(&self) -> usize {
        self.inner.read().await.chunks.len()
    }

    /// Username that first stored `full_name`, if any.
    pub async fn owner_of(&self, full_name: &str) -> Option<String> {
        self.inner
            .read()
            .await
            .repositories
            .iter()
            .find(|r| r.info.full_name == full_name)
            .map(|r| r.github_username.clone())
    }
}

#[async_trait]
impl RepositoryStore for InMemoryRepositoryStore {
    async fn store_repository(
        &self,
        github_username: &str,
        repo: &RepositoryInfo,
    ) -> Result<i64, StargazeError> {
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner
            .repositories
            .iter()
            .find(|r| r.info.full_name == repo.full_name)
        {
            log::info!(
                "Repository {} already exists, skipping insertion",
                repo.full_name
            );
            return Ok(existing.id);
        }

        let id = inner.repositories.len() as i64 + 1;
        inner.repositories.push(StoredRepository {
            id,
            github_username: github_username.to_string(),
            info: repo.clone(),
        });
        Ok(id)
    }

    async fn store_chunks(
        &self,
        repository_id: i64,
        chunks: Vec<(String, Vec<f32>)>,
    ) -> Result<(), StargazeError> {
        let mut inner = self.inner.write().await;

        if !inner.repositories.iter().any(|r| r.id == repository_id) {
            return Err(StargazeError::StorageError(format!(
                "Unknown repository id {}",
                repository_id
            )));
        }

        let expected = inner
            .embedding_dimension
            .or_else(|| chunks.first().map(|(_, embedding)| embedding.len()));
        if let Some(expected) = expected {
            if let Some((_, embedding)) = chunks.iter().find(|(_, e)| e.len() != expected) {
                return Err(StargazeError::StorageError(format!(
                    "Embedding dimension mismatch: expected {}, got {}",
                    expected,
                    embedding.len()
                )));
            }
            inner.embedding_dimension = Some(expected);
        }

        // A re-ingest replaces every chunk of the repository
        inner.chunks.retain(|c| c.repository_id != repository_id);
        for (chunk_seq, (chunk, embedding)) in chunks.into_iter().enumerate() {
            inner.chunks.push(StoredChunk {
                repository_id,
                chunk_seq,
                chunk,
                embedding,
            });
        }

        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RepoMatch>, StargazeError> {
        let inner = self.inner.read().await;

        let mut scored: Vec<(f64, &StoredChunk)> = inner
            .chunks
            .iter()
            .map(|c| (cosine_similarity(query_embedding, &c.embedding) as f64, c))
            .collect();
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.chunk_seq.cmp(&b.1.chunk_seq))
        });
        scored.truncate(limit);

        let matches = scored
            .into_iter()
            .filter_map(|(similarity, chunk)| {
                let repo = inner
                    .repositories
                    .iter()
                    .find(|r| r.id == chunk.repository_id)?;
                Some(RepoMatch {
                    name: repo.info.name.clone(),
                    full_name: repo.info.full_name.clone(),
                    url: repo.info.url.clone(),
                    description: repo.info.description.clone(),
                    chunk: chunk.chunk.clone(),
                    similarity,
                })
            })
            .collect();

        Ok(dedupe_by_repository(matches))
    }
}
