//! Core of Stargaze: chat over a user's starred GitHub repositories.
//!
//! - **Ingestion** pages through a user's stars, fetches each README, splits
//!   it into Markdown-aware chunks and stores the chunk embeddings.
//! - **Retrieval** embeds a question, finds the closest chunks, and asks a
//!   chat model to explain the matching repositories.
//! - **Providers** talk to OpenAI or a local Ollama server.
//! - **Storage** is Postgres with pgvector, or an in-memory store.
//! - **Auth** holds the session callbacks used by the chat page.

pub mod auth;
pub mod chat;
pub mod config;
pub mod core_types;
pub mod errors;
pub mod github;
pub mod ingest;
pub mod llm;
pub mod rag;
pub mod retrieval;
pub mod service_factory;
pub mod store;

pub use auth::AuthCallbacks;
pub use chat::ChatService;
pub use config::*;
pub use errors::StargazeError;
pub use github::GitHubClient;
pub use ingest::{IngestObserver, Ingestor, NoopObserver};
pub use llm::LLM;
pub use retrieval::Retriever;
pub use service_factory::{ServiceFactory, Services};
pub use store::{InMemoryRepositoryStore, PgRepositoryStore, RepoMatch, RepositoryStore};
