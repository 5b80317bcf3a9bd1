//! Persistence for starred repositories and their README embeddings.
//!
//! Two backends implement [`RepositoryStore`]: [`PgRepositoryStore`] on top of
//! Postgres with the `vector` extension, and [`InMemoryRepositoryStore`] for
//! tests and database-less runs.

use crate::errors::StargazeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stargaze_types::RepositoryInfo;
use std::collections::HashSet;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryRepositoryStore;
pub use postgres::PgRepositoryStore;

/// A README chunk matched by a similarity search, joined to its repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RepoMatch {
    pub name: String,
    pub full_name: String,
    pub url: String,
    pub description: Option<String>,
    pub chunk: String,
    /// `1 - cosine distance`
    pub similarity: f64,
}

#[async_trait]
pub trait RepositoryStore: Send + Sync {
    /// Insert a repository and return its id. A repository whose `full_name`
    /// is already stored is not inserted again; the existing id is returned.
    async fn store_repository(
        &self,
        github_username: &str,
        repo: &RepositoryInfo,
    ) -> Result<i64, StargazeError>;

    /// Store embedded chunks for a repository, numbered in the given order.
    async fn store_chunks(
        &self,
        repository_id: i64,
        chunks: Vec<(String, Vec<f32>)>,
    ) -> Result<(), StargazeError>;

    /// Nearest `limit` chunks to the query, best first, one per repository.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RepoMatch>, StargazeError>;
}

/// Keep the first (best) match per repository, preserving order.
pub(crate) fn dedupe_by_repository(matches: Vec<RepoMatch>) -> Vec<RepoMatch> {
    let mut seen = HashSet::new();
    matches
        .into_iter()
        .filter(|m| seen.insert(m.full_name.clone()))
        .collect()
}
