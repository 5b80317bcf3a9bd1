//! Mock GitHub REST API for ingestion tests
//!
//! Serves the two endpoints the stars ingester calls, `GET
//! /users/{user}/starred` (paginated with a `Link` header) and `GET
//! /repos/{owner}/{repo}/readme` (base64 contents), from an in-memory
//! fixture. Tests start it on an ephemeral port and point the GitHub client
//! at its URL.

pub mod fixtures;
pub mod handlers;
pub mod server;

pub use fixtures::{FileContent, Repository, RepositoryFixture};
pub use server::{MockServer, RunningMockServer};

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::new().start().await.unwrap();
        let response = reqwest::get(format!("{}/health", server.url()))
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn test_starred_pagination_headers() {
        let server = MockServer::new().start().await.unwrap();
        let response = reqwest::get(format!(
            "{}/users/octocat/starred?per_page=1",
            server.url()
        ))
        .await
        .unwrap();

        let link = response
            .headers()
            .get("link")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(link.contains("page=3&per_page=1>; rel=\"last\""));

        let items: Vec<serde_json::Value> = response.json().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["full_name"], "timescale/pgai");
        assert_eq!(items[0]["html_url"], "https://github.com/timescale/pgai");
    }

    #[tokio::test]
    async fn test_unknown_user_and_missing_readme() {
        let server = MockServer::new().start().await.unwrap();

        let response = reqwest::get(format!("{}/users/nobody/starred", server.url()))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);

        let response = reqwest::get(format!("{}/repos/octocat/dotfiles/readme", server.url()))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_readme_is_base64() {
        use base64::Engine;

        let server = MockServer::new().start().await.unwrap();
        let body: serde_json::Value =
            reqwest::get(format!("{}/repos/tokio-rs/axum/readme", server.url()))
                .await
                .unwrap()
                .json()
                .await
                .unwrap();

        assert_eq!(body["encoding"], "base64");
        let encoded: String = body["content"]
            .as_str()
            .unwrap()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert!(String::from_utf8(decoded).unwrap().starts_with("# axum"));
    }
}
