//! Builds the chat and ingestion services from a `StargazeConfig`

use crate::auth::AuthCallbacks;
use crate::chat::ChatService;
use crate::config::StargazeConfig;
use crate::core_types::GenerationOptions;
use crate::errors::StargazeError;
use crate::github::GitHubClient;
use crate::ingest::Ingestor;
use crate::llm::{ProviderFactory, ProviderSet};
use crate::rag::TextSplitter;
use crate::retrieval::Retriever;
use crate::store::{InMemoryRepositoryStore, PgRepositoryStore, RepositoryStore};
use std::sync::Arc;

/// Everything the HTTP layer needs, wired from one configuration.
#[derive(Clone)]
pub struct Services {
    pub chat: ChatService,
    pub ingestor: Arc<Ingestor>,
    pub auth: AuthCallbacks,
}

pub struct ServiceFactory;

impl ServiceFactory {
    pub async fn create_from_config(config: &StargazeConfig) -> Result<Services, StargazeError> {
        let providers =
            ProviderFactory::from_config(&config.ai, config.embedding_dimension())?;
        let store = Self::configure_store(config).await?;
        Ok(Self::assemble(config, providers, store))
    }

    /// Wire services around already-built providers and store.
    pub fn assemble(
        config: &StargazeConfig,
        providers: ProviderSet,
        store: Arc<dyn RepositoryStore>,
    ) -> Services {
        let retriever = Retriever::new(
            store.clone(),
            providers.embeddings.clone(),
            providers.llm.clone(),
        )
        .with_top_k(config.retrieval.top_k)
        .with_options(GenerationOptions {
            max_tokens: config.ai.max_tokens,
            temperature: config.ai.temperature,
        });

        let ingestor = Ingestor::new(
            GitHubClient::from_config(&config.github),
            store,
            providers.embeddings,
        )
        .with_splitter(TextSplitter::markdown(
            config.retrieval.chunk_size,
            config.retrieval.chunk_overlap,
        ))
        .with_per_page(config.github.per_page);

        Services {
            chat: ChatService::new(retriever),
            ingestor: Arc::new(ingestor),
            auth: AuthCallbacks::new(&config.auth),
        }
    }

    async fn configure_store(
        config: &StargazeConfig,
    ) -> Result<Arc<dyn RepositoryStore>, StargazeError> {
        match &config.database.url {
            Some(url) => {
                let store = PgRepositoryStore::connect(
                    url,
                    config.database.max_connections,
                    config.embedding_dimension(),
                )
                .await?;
                store.ensure_schema().await?;
                Ok(Arc::new(store))
            }
            None => {
                log::warn!("DB_CONNECTION not set, using in-memory repository store");
                Ok(Arc::new(InMemoryRepositoryStore::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_config_uses_memory_store() {
        let services = ServiceFactory::create_from_config(&StargazeConfig::default())
            .await
            .unwrap();
        assert!(services.chat.history().await.is_empty());
        assert!(services.auth.authorized(None));
    }
}
