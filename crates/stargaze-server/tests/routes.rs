use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use github_mock::MockServer;
use stargaze_core::core_types::{ChatMessage, GenerationOptions, LLMResponse};
use stargaze_core::llm::ProviderSet;
use stargaze_core::rag::DummyEmbeddingGenerator;
use stargaze_core::{InMemoryRepositoryStore, ServiceFactory, StargazeConfig, StargazeError, LLM};
use stargaze_server::{ServerConfig, StargazeServer};
use stargaze_types::{ChatResponse, IngestResponse, Message, ResponseMetadata};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

struct StubModel {
    fail: bool,
}

#[async_trait]
impl LLM for StubModel {
    async fn generate(
        &self,
        _messages: Vec<ChatMessage>,
        _options: GenerationOptions,
    ) -> Result<LLMResponse, StargazeError> {
        if self.fail {
            return Err(StargazeError::LLMError("model offline".to_string()));
        }
        Ok(LLMResponse {
            content: "You starred **pgai**.".to_string(),
            metadata: ResponseMetadata {
                model: Some("stub".to_string()),
                total_duration: Some(2_500_000_000),
                prompt_eval_count: Some(10),
                eval_count: Some(5),
                ..Default::default()
            },
        })
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}

fn app_with(config: StargazeConfig, fail: bool) -> Router {
    let providers = ProviderSet {
        llm: Arc::new(StubModel { fail }),
        embeddings: Arc::new(DummyEmbeddingGenerator::with_dimension(16)),
    };
    let services =
        ServiceFactory::assemble(&config, providers, Arc::new(InMemoryRepositoryStore::new()));
    StargazeServer::with_config(services, ServerConfig::new().with_logging(false)).build_router()
}

fn app() -> Router {
    app_with(StargazeConfig::default(), false)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_empty_message_is_bad_request() {
    let response = app()
        .oneshot(post_json("/chat", serde_json::json!({"message": "   "})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "No message provided");
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn test_missing_message_is_bad_request() {
    let response = app()
        .oneshot(post_json("/chat", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_round_trip_accumulates_history() {
    let app = app();

    let response = app
        .clone()
        .oneshot(post_json("/chat", serde_json::json!({"message": "postgres ai"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let chat: ChatResponse = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(chat.response, "You starred **pgai**.");
    assert_eq!(chat.chat_history.len(), 2);
    assert_eq!(chat.chat_history[0], Message::user("postgres ai"));
    let metadata = chat.chat_history[1].metadata().unwrap();
    assert_eq!(metadata.total_tokens(), Some(15));

    let response = app
        .oneshot(post_json(
            "/chat",
            serde_json::json!({"message": "and rust?", "format_only": true}),
        ))
        .await
        .unwrap();
    let chat: ChatResponse = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(chat.chat_history.len(), 4);
    assert!(chat
        .response
        .starts_with("# Your Starred Repositories Related to \"and rust?\""));
}

#[tokio::test]
async fn test_model_failure_is_internal_error() {
    let response = app_with(StargazeConfig::default(), true)
        .oneshot(post_json("/chat", serde_json::json!({"message": "hello"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "llm_error");
    assert!(body["detail"].as_str().unwrap().contains("model offline"));
}

#[tokio::test]
async fn test_empty_username_is_bad_request() {
    let response = app()
        .oneshot(post_json("/ingest", serde_json::json!({"github_username": ""})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "No GitHub username provided");
}

#[tokio::test]
async fn test_ingest_then_chat_finds_starred_repository() {
    let github = MockServer::new().start().await.unwrap();
    let mut config = StargazeConfig::default();
    config.github.api_base_url = github.url();
    let app = app_with(config, false);

    let response = app
        .clone()
        .oneshot(post_json(
            "/ingest",
            serde_json::json!({"github_username": "octocat"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let ingest: IngestResponse = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(ingest.message, "GitHub user stars processed successfully");
    assert_eq!(ingest.result.github_username, "octocat");
    assert_eq!(ingest.result.repos_processed, 3);

    let response = app
        .oneshot(post_json(
            "/chat",
            serde_json::json!({"message": "rag in postgres", "format_only": true}),
        ))
        .await
        .unwrap();
    let chat: ChatResponse = serde_json::from_value(body_json(response).await).unwrap();
    assert!(chat.response.contains("*Relevance: "));
}

#[tokio::test]
async fn test_ingest_unknown_user_is_internal_error() {
    let github = MockServer::new().start().await.unwrap();
    let mut config = StargazeConfig::default();
    config.github.api_base_url = github.url();

    let response = app_with(config, false)
        .oneshot(post_json(
            "/ingest",
            serde_json::json!({"github_username": "nobody"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "github_error");
}
