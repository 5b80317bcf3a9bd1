use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::fixtures::RepositoryFixture;
use crate::handlers::{get_readme, health_check, list_starred};

pub struct MockServer {
    fixture: Arc<RepositoryFixture>,
}

/// A mock server running in the background; aborted on drop.
pub struct RunningMockServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl RunningMockServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL to use in place of `https://api.github.com`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for RunningMockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl MockServer {
    pub fn new() -> Self {
        Self::with_fixture(RepositoryFixture::create_test_fixture())
    }

    pub fn with_fixture(fixture: RepositoryFixture) -> Self {
        Self {
            fixture: Arc::new(fixture),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route("/users/{user}/starred", get(list_starred))
            .route("/repos/{owner}/{repo}/readme", get(get_readme))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.fixture.clone())
    }

    /// Serve until the process is stopped.
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let addr: SocketAddr = addr.parse()?;
        let listener = TcpListener::bind(addr).await?;
        log::info!("GitHub mock server listening on http://{}", addr);
        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    /// Bind an ephemeral localhost port and serve in the background.
    pub async fn start(self) -> anyhow::Result<RunningMockServer> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let router = self.router();

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                log::error!("GitHub mock server error: {}", e);
            }
        });

        log::debug!("GitHub mock server started on {}", addr);
        Ok(RunningMockServer { addr, handle })
    }

    pub fn get_fixture(&self) -> Arc<RepositoryFixture> {
        self.fixture.clone()
    }
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}
