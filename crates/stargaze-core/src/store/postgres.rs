use crate::errors::StargazeError;
use crate::store::{dedupe_by_repository, RepoMatch, RepositoryStore};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use stargaze_types::RepositoryInfo;

/// Repository store backed by Postgres and the pgvector extension.
///
/// Chunks live in `repositories_embedding_store` keyed by repository id and
/// `chunk_seq`; similarity uses the `<=>` cosine distance operator.
#[derive(Debug, Clone)]
pub struct PgRepositoryStore {
    pool: PgPool,
    embedding_dimension: usize,
}

impl PgRepositoryStore {
    pub fn new(pool: PgPool, embedding_dimension: usize) -> Self {
        Self {
            pool,
            embedding_dimension,
        }
    }

    pub async fn connect(
        url: &str,
        max_connections: u32,
        embedding_dimension: usize,
    ) -> Result<Self, StargazeError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| {
                StargazeError::StorageError(format!("Failed to connect to database: {}", e))
            })?;

        log::info!("Connected to Postgres (pool size {})", max_connections);
        Ok(Self::new(pool, embedding_dimension))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the extension and tables if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), StargazeError> {
        for statement in schema_statements(self.embedding_dimension) {
            sqlx::query(&statement).execute(&self.pool).await?;
        }
        log::debug!("Database schema is in place");
        Ok(())
    }
}

fn schema_statements(embedding_dimension: usize) -> Vec<String> {
    vec![
        "CREATE EXTENSION IF NOT EXISTS vector".to_string(),
        "CREATE TABLE IF NOT EXISTS repositories (
            id BIGSERIAL PRIMARY KEY,
            github_username TEXT NOT NULL,
            name TEXT NOT NULL,
            full_name TEXT NOT NULL UNIQUE,
            readme TEXT,
            description TEXT,
            url TEXT NOT NULL,
            language TEXT,
            stars BIGINT NOT NULL DEFAULT 0
        )"
        .to_string(),
        format!(
            "CREATE TABLE IF NOT EXISTS repositories_embedding_store (
            embedding_uuid UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            id BIGINT NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
            chunk_seq INTEGER NOT NULL,
            chunk TEXT NOT NULL,
            embedding vector({}) NOT NULL,
            UNIQUE (id, chunk_seq)
        )",
            embedding_dimension
        ),
    ]
}

/// pgvector text representation, bound as text and cast with `::vector`.
pub(crate) fn vector_literal(embedding: &[f32]) -> String {
    let values: Vec<String> = embedding.iter().map(|v| v.to_string()).collect();
    format!("[{}]", values.join(","))
}

const SEARCH_SQL: &str = "
    WITH res AS (
        SELECT id, chunk, embedding <=> $1::vector AS distance
        FROM repositories_embedding_store
        ORDER BY distance
        LIMIT $2
    )
    SELECT r.name, r.full_name, r.url, r.description, res.chunk,
           (1 - res.distance)::float8 AS similarity
    FROM res
    JOIN repositories r ON r.id = res.id
    ORDER BY similarity DESC";

#[async_trait]
impl RepositoryStore for PgRepositoryStore {
    async fn store_repository(
        &self,
        github_username: &str,
        repo: &RepositoryInfo,
    ) -> Result<i64, StargazeError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM repositories WHERE full_name = $1")
                .bind(&repo.full_name)
                .fetch_optional(&mut *tx)
                .await?;

        if let Some((id,)) = existing {
            log::info!(
                "Repository {} already exists, skipping insertion",
                repo.full_name
            );
            return Ok(id);
        }

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO repositories
                (github_username, name, full_name, readme, description, url, language, stars)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
        )
        .bind(github_username)
        .bind(&repo.name)
        .bind(&repo.full_name)
        .bind(&repo.readme)
        .bind(&repo.description)
        .bind(&repo.url)
        .bind(&repo.language)
        .bind(repo.stars as i64)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            StargazeError::StorageError(format!("Error storing repository: {}", e))
        })?;

        tx.commit().await?;
        Ok(id)
    }

    async fn store_chunks(
        &self,
        repository_id: i64,
        chunks: Vec<(String, Vec<f32>)>,
    ) -> Result<(), StargazeError> {
        check_dimensions(self.embedding_dimension, &chunks)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM repositories_embedding_store WHERE id = $1 AND chunk_seq >= $2",
        )
        .bind(repository_id)
        .bind(chunks.len() as i32)
        .execute(&mut *tx)
        .await?;

        for (chunk_seq, (chunk, embedding)) in chunks.iter().enumerate() {
            sqlx::query(
                "INSERT INTO repositories_embedding_store (id, chunk_seq, chunk, embedding)
                 VALUES ($1, $2, $3, $4::vector)
                 ON CONFLICT (id, chunk_seq)
                 DO UPDATE SET chunk = EXCLUDED.chunk, embedding = EXCLUDED.embedding",
            )
            .bind(repository_id)
            .bind(chunk_seq as i32)
            .bind(chunk)
            .bind(vector_literal(embedding))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        log::debug!(
            "Stored {} chunks for repository {}",
            chunks.len(),
            repository_id
        );
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RepoMatch>, StargazeError> {
        log::info!("Executing semantic search query");
        let matches: Vec<RepoMatch> = sqlx::query_as(SEARCH_SQL)
            .bind(vector_literal(query_embedding))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        log::info!("Search query returned {} results", matches.len());
        Ok(dedupe_by_repository(matches))
    }
}

fn check_dimensions(expected: usize, chunks: &[(String, Vec<f32>)]) -> Result<(), StargazeError> {
    match chunks.iter().find(|(_, embedding)| embedding.len() != expected) {
        Some((_, embedding)) => Err(StargazeError::StorageError(format!(
            "Embedding dimension mismatch: expected {}, got {}",
            expected,
            embedding.len()
        ))),
        None => Ok(()),
    }
}
