use github_mock::MockServer;
use stargaze_core::rag::DummyEmbeddingGenerator;
use stargaze_core::{GitHubClient, InMemoryRepositoryStore, Ingestor};
use stargaze_server::ws::run_ingestion;
use stargaze_types::{IngestStatus, WsEvent};
use std::sync::Arc;
use tokio::sync::mpsc;

async fn collect_events(ingestor: &Ingestor, username: &str) -> Vec<WsEvent> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    run_ingestion(ingestor, username, &tx).await;
    drop(tx);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

fn ingestor(url: String) -> Ingestor {
    Ingestor::new(
        GitHubClient::new(url),
        Arc::new(InMemoryRepositoryStore::new()),
        Arc::new(DummyEmbeddingGenerator::with_dimension(16)),
    )
}

#[tokio::test]
async fn test_statuses_then_result() {
    let github = MockServer::new().start().await.unwrap();
    let events = collect_events(&ingestor(github.url()), "octocat").await;

    assert_eq!(
        events.first(),
        Some(&WsEvent::Status {
            status: IngestStatus::fetching_repos()
        })
    );
    assert_eq!(
        events[1],
        WsEvent::Status {
            status: IngestStatus::progress("timescale/pgai", 0, 3)
        }
    );
    assert_eq!(
        events[events.len() - 2],
        WsEvent::Status {
            status: IngestStatus::complete()
        }
    );
    match events.last() {
        Some(WsEvent::Result(result)) => assert_eq!(result.repos_processed, 3),
        other => panic!("expected a result frame, got {:?}", other),
    }

    let frame = serde_json::to_value(&events[0]).unwrap();
    assert_eq!(frame, serde_json::json!({"status": {"status": "FETCHING_REPOS"}}));
}

#[tokio::test]
async fn test_failure_ends_with_error_frame() {
    let github = MockServer::new().start().await.unwrap();
    let events = collect_events(&ingestor(github.url()), "nobody").await;

    assert_eq!(events.len(), 2);
    match &events[1] {
        WsEvent::Error { error } => assert!(error.starts_with("GitHub request failed")),
        other => panic!("expected an error frame, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_username_reports_error_without_statuses() {
    let events = collect_events(&ingestor("http://127.0.0.1:9".to_string()), "").await;
    assert_eq!(
        events,
        vec![WsEvent::Error {
            error: "Validation error: No GitHub username provided".to_string()
        }]
    );
}
