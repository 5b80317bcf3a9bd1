//! Ingestion request, result and progress types.

use serde::{Deserialize, Serialize};

/// Body of `POST /ingest` and of websocket ingestion requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub github_username: String,
}

/// A starred repository as seen by the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub readme: Option<String>,
    pub url: String,
    pub language: Option<String>,
    pub stars: u64,
}

/// Summary of a finished ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResult {
    pub github_username: String,
    pub repos_processed: usize,
    pub repositories: Vec<RepositoryInfo>,
    pub status: String,
}

/// Successful response of `POST /ingest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub message: String,
    pub result: IngestResult,
}

/// Coarse ingestion phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngestPhase {
    FetchingRepos,
    Complete,
}

/// Per-repository progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestProgress {
    pub current_repo: String,
    pub processed_count: usize,
    pub total_count: usize,
}

/// A progress update emitted while ingesting.
///
/// Serializes as either `{"status": "FETCHING_REPOS"}` / `{"status": "COMPLETE"}`
/// or `{"current_repo": ..., "processed_count": ..., "total_count": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IngestStatus {
    Progress(IngestProgress),
    Phase { status: IngestPhase },
}

impl IngestStatus {
    pub fn fetching_repos() -> Self {
        IngestStatus::Phase {
            status: IngestPhase::FetchingRepos,
        }
    }

    pub fn complete() -> Self {
        IngestStatus::Phase {
            status: IngestPhase::Complete,
        }
    }

    pub fn progress(current_repo: impl Into<String>, processed_count: usize, total_count: usize) -> Self {
        IngestStatus::Progress(IngestProgress {
            current_repo: current_repo.into(),
            processed_count,
            total_count,
        })
    }

    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            IngestStatus::Phase {
                status: IngestPhase::Complete
            }
        )
    }
}

/// Frames sent by the server on the `/ws` websocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WsEvent {
    /// `{"status": <IngestStatus>}`
    Status { status: IngestStatus },
    /// The final [`IngestResult`].
    Result(IngestResult),
    /// `{"error": "..."}`
    Error { error: String },
}
