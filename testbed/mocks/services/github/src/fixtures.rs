use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub readme: Option<FileContent>,
}

impl Repository {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileContent {
    pub content: String,
    pub encoding: String, // "utf-8" or "base64"
}

impl FileContent {
    pub fn text(content: &str) -> Self {
        Self {
            content: content.to_string(),
            encoding: "utf-8".to_string(),
        }
    }
}

/// Starred repositories per user, in starring order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryFixture {
    stars: HashMap<String, Vec<Repository>>,
}

impl RepositoryFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&mut self, login: &str) {
        self.stars.entry(login.to_string()).or_default();
    }

    pub fn add_star(&mut self, login: &str, repo: Repository) {
        self.stars.entry(login.to_string()).or_default().push(repo);
    }

    pub fn starred(&self, login: &str) -> Option<&[Repository]> {
        self.stars.get(login).map(Vec::as_slice)
    }

    /// Look a repository up across every user's stars.
    pub fn get_repository(&self, owner: &str, name: &str) -> Option<&Repository> {
        self.stars
            .values()
            .flatten()
            .find(|repo| repo.owner == owner && repo.name == name)
    }

    pub fn from_yaml(yaml_content: &str) -> anyhow::Result<Self> {
        let stars: HashMap<String, Vec<Repository>> = serde_yaml::from_str(yaml_content)?;
        Ok(Self { stars })
    }

    /// `octocat` stars three repositories, one of them without a README.
    /// `lurker` exists but has starred nothing.
    pub fn create_test_fixture() -> Self {
        let mut fixture = Self::new();

        fixture.add_star(
            "octocat",
            Repository {
                name: "pgai".to_string(),
                owner: "timescale".to_string(),
                description: Some("A suite of tools to develop RAG applications".to_string()),
                language: Some("Python".to_string()),
                stargazers_count: 2400,
                readme: Some(FileContent::text(
                    "# pgai\n\nAI workflows inside PostgreSQL.\n\n## Vectorizer\nAutomatically create and sync embeddings.",
                )),
            },
        );
        fixture.add_star(
            "octocat",
            Repository {
                name: "axum".to_string(),
                owner: "tokio-rs".to_string(),
                description: Some("Ergonomic and modular web framework".to_string()),
                language: Some("Rust".to_string()),
                stargazers_count: 19000,
                readme: Some(FileContent::text(
                    "# axum\n\nWeb application framework built with Tokio, Tower and Hyper.",
                )),
            },
        );
        fixture.add_star(
            "octocat",
            Repository {
                name: "dotfiles".to_string(),
                owner: "octocat".to_string(),
                description: None,
                language: None,
                stargazers_count: 3,
                readme: None,
            },
        );
        fixture.add_user("lurker");

        fixture
    }
}
