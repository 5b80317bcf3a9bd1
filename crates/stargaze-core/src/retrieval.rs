//! Similarity search over starred repositories and answer generation.

use crate::core_types::{ChatMessage, GenerationOptions};
use crate::errors::StargazeError;
use crate::llm::LLM;
use crate::rag::EmbeddingGenerator;
use crate::store::{RepoMatch, RepositoryStore};
use stargaze_types::ResponseMetadata;
use std::sync::Arc;

pub const SYSTEM_PROMPT: &str = "You are a technical assistant specializing in analyzing GitHub repositories.
Provide concise, structured responses that:
1. Focus on how each repository specifically addresses the user's query
2. Highlight key technical features and capabilities
3. Keep explanations brief and to the point
4. Use markdown formatting appropriately";

const RELEVANCE_NOTE: &str = "\nNote: The relevance scores are based on the similarity of the repository names and descriptions to the query.";

/// Render search hits as a Markdown list headed by the query.
pub fn format_repo_context(matches: &[RepoMatch], query: &str) -> String {
    let mut context = vec![format!(
        "# Your Starred Repositories Related to \"{}\"",
        query
    )];

    for repo in matches {
        context.push(format!(
            "[{}]({}) - {} *Relevance: {:.1}%*",
            repo.name,
            repo.url,
            repo.description.as_deref().unwrap_or_default().trim(),
            repo.similarity * 100.0
        ));
    }

    context.push(RELEVANCE_NOTE.to_string());
    context.join("\n")
}

pub fn build_user_prompt(repo_context: &str) -> String {
    format!(
        "Based on the following repository information, provide a structured response that helps the user understand the most relevant repositories for their query.\n\n{}\n\nFocus on concrete technical details rather than general statements.",
        repo_context
    )
}

/// Text of a reply plus the provider metadata, when a model was called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalAnswer {
    pub text: String,
    pub metadata: Option<ResponseMetadata>,
}

#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn RepositoryStore>,
    embeddings: Arc<dyn EmbeddingGenerator>,
    llm: Arc<dyn LLM>,
    top_k: usize,
    options: GenerationOptions,
}

impl Retriever {
    pub fn new(
        store: Arc<dyn RepositoryStore>,
        embeddings: Arc<dyn EmbeddingGenerator>,
        llm: Arc<dyn LLM>,
    ) -> Self {
        Self {
            store,
            embeddings,
            llm,
            top_k: 5,
            options: GenerationOptions::default(),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub async fn search(&self, query: &str) -> Result<Vec<RepoMatch>, StargazeError> {
        let query_embedding = self.embeddings.generate_embedding(query).await?;
        self.store.search(&query_embedding, self.top_k).await
    }

    /// Answer `query` from the starred repositories.
    ///
    /// With `format_only` the formatted repository list is returned as is
    /// and no model is called.
    pub async fn generate_response(
        &self,
        query: &str,
        format_only: bool,
    ) -> Result<RetrievalAnswer, StargazeError> {
        log::info!("Generating response based on similar repositories");
        let matches = self.search(query).await?;
        let repo_context = format_repo_context(&matches, query);

        if format_only {
            return Ok(RetrievalAnswer {
                text: repo_context,
                metadata: None,
            });
        }

        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_user_prompt(&repo_context)),
        ];

        let response = self.llm.generate(messages, self.options).await?;
        log::info!(
            "Generated response with {} ({} chars)",
            self.llm.model_name(),
            response.content.len()
        );

        Ok(RetrievalAnswer {
            text: response.content,
            metadata: Some(response.metadata),
        })
    }
}
