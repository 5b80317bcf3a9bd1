//! Stars ingestion: GitHub stars → README chunks → embeddings → store.

use crate::errors::StargazeError;
use crate::github::GitHubClient;
use crate::rag::{EmbeddingGenerator, TextSplitter};
use crate::store::RepositoryStore;
use async_trait::async_trait;
use stargaze_types::{IngestResult, IngestStatus, RepositoryInfo};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Receives progress updates while an ingestion runs.
#[async_trait]
pub trait IngestObserver: Send + Sync {
    async fn on_status(&self, status: IngestStatus);
}

/// Observer that drops every update.
pub struct NoopObserver;

#[async_trait]
impl IngestObserver for NoopObserver {
    async fn on_status(&self, _status: IngestStatus) {}
}

#[async_trait]
impl IngestObserver for mpsc::UnboundedSender<IngestStatus> {
    async fn on_status(&self, status: IngestStatus) {
        if self.send(status).is_err() {
            log::debug!("Ingestion status receiver dropped");
        }
    }
}

pub struct Ingestor {
    github: GitHubClient,
    store: Arc<dyn RepositoryStore>,
    embeddings: Arc<dyn EmbeddingGenerator>,
    splitter: TextSplitter,
    per_page: u32,
}

impl Ingestor {
    pub fn new(
        github: GitHubClient,
        store: Arc<dyn RepositoryStore>,
        embeddings: Arc<dyn EmbeddingGenerator>,
    ) -> Self {
        Self {
            github,
            store,
            embeddings,
            splitter: TextSplitter::markdown(1000, 200),
            per_page: 100,
        }
    }

    pub fn with_splitter(mut self, splitter: TextSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, 100);
        self
    }

    /// Fetch and store every repository `username` has starred.
    ///
    /// Repositories without a README are counted and returned but not
    /// stored. The first GitHub, embedding or storage error aborts the run.
    pub async fn ingest(
        &self,
        username: &str,
        observer: &dyn IngestObserver,
    ) -> Result<IngestResult, StargazeError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(StargazeError::ValidationError(
                "No GitHub username provided".to_string(),
            ));
        }

        log::info!(
            "Starting to fetch and process starred repositories for user: {}",
            username
        );
        observer.on_status(IngestStatus::fetching_repos()).await;

        let total = self.github.starred_count(username).await?;
        let mut processed: Vec<RepositoryInfo> = Vec::new();
        let mut page = 1;

        loop {
            let starred = self
                .github
                .starred_page(username, page, self.per_page)
                .await?;
            if starred.repos.is_empty() {
                break;
            }

            log::info!(
                "Processing {} repositories on page {}",
                starred.repos.len(),
                page
            );

            for repo in starred.repos {
                observer
                    .on_status(IngestStatus::progress(
                        repo.full_name.clone(),
                        processed.len(),
                        total,
                    ))
                    .await;

                let readme = self.github.fetch_readme(&repo.full_name).await;
                let info = repo.into_info(readme);

                match info.readme.as_deref() {
                    Some(readme) => {
                        self.store_with_chunks(username, &info, readme).await?;
                        log::info!("Processed and stored info for {}", info.full_name);
                    }
                    None => log::warn!("No README found for {}", info.full_name),
                }

                processed.push(info);
            }

            if !starred.has_next {
                break;
            }
            page += 1;
        }

        log::info!(
            "Finished processing {} repositories for user: {}",
            processed.len(),
            username
        );
        observer.on_status(IngestStatus::complete()).await;

        Ok(IngestResult {
            github_username: username.to_string(),
            repos_processed: processed.len(),
            repositories: processed,
            status: "success".to_string(),
        })
    }

    async fn store_with_chunks(
        &self,
        username: &str,
        info: &RepositoryInfo,
        readme: &str,
    ) -> Result<(), StargazeError> {
        let repository_id = self.store.store_repository(username, info).await?;

        let chunks = self.splitter.split_text(readme);
        if chunks.is_empty() {
            return Ok(());
        }

        let embeddings = self.embeddings.generate_embeddings(&chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(StargazeError::IngestError(format!(
                "Expected {} embeddings for {}, got {}",
                chunks.len(),
                info.full_name,
                embeddings.len()
            )));
        }

        self.store
            .store_chunks(repository_id, chunks.into_iter().zip(embeddings).collect())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::DummyEmbeddingGenerator;
    use crate::store::InMemoryRepositoryStore;

    #[tokio::test]
    async fn test_empty_username_rejected() {
        let ingestor = Ingestor::new(
            GitHubClient::new("http://127.0.0.1:9"),
            Arc::new(InMemoryRepositoryStore::new()),
            Arc::new(DummyEmbeddingGenerator::with_dimension(8)),
        );
        let err = ingestor.ingest("   ", &NoopObserver).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: No GitHub username provided"
        );
    }

    #[tokio::test]
    async fn test_channel_observer_forwards_statuses() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.on_status(IngestStatus::complete()).await;
        assert_eq!(rx.recv().await, Some(IngestStatus::complete()));

        drop(rx);
        // A closed receiver is not an error for the ingestion
        tx.on_status(IngestStatus::fetching_repos()).await;
    }
}
