//! Minimal GitHub REST client for listing stars and fetching READMEs.

use crate::config::GitHubConfig;
use crate::errors::StargazeError;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, LINK, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use stargaze_types::RepositoryInfo;

const USER_AGENT_VALUE: &str = concat!("stargaze/", env!("CARGO_PKG_VERSION"));

/// A repository as listed by `GET /users/{user}/starred`.
#[derive(Debug, Clone, Deserialize)]
pub struct StarredRepo {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
}

impl StarredRepo {
    pub fn into_info(self, readme: Option<String>) -> RepositoryInfo {
        RepositoryInfo {
            name: self.name,
            full_name: self.full_name,
            description: self.description,
            readme,
            url: self.html_url,
            language: self.language,
            stars: self.stargazers_count,
        }
    }
}

/// One page of starred repositories.
#[derive(Debug, Clone)]
pub struct StarredPage {
    pub repos: Vec<StarredRepo>,
    pub has_next: bool,
}

#[derive(Debug, Deserialize)]
struct ReadmeResponse {
    content: String,
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    api_base_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn from_config(config: &GitHubConfig) -> Self {
        Self::new(config.api_base_url.clone()).with_token(config.token.clone())
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Some(token) = &self.token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(reqwest::header::AUTHORIZATION, value);
            }
        }
        headers
    }

    async fn get_starred(
        &self,
        username: &str,
        page: Option<u32>,
        per_page: u32,
    ) -> Result<(Option<String>, Vec<StarredRepo>), StargazeError> {
        let mut url = format!(
            "{}/users/{}/starred?per_page={}",
            self.api_base_url, username, per_page
        );
        if let Some(page) = page {
            url.push_str(&format!("&page={}", page));
        }
        log::info!("Fetching starred repositories from: {}", url);

        let response = self
            .client
            .get(&url)
            .headers(self.headers())
            .send()
            .await
            .map_err(|e| StargazeError::GitHubError(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StargazeError::GitHubError(format!(
                "GitHub returned {} for {}: {}",
                status, url, body
            )));
        }

        let link = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let repos: Vec<StarredRepo> = response.json().await.map_err(|e| {
            StargazeError::GitHubError(format!("Failed to parse starred repositories: {}", e))
        })?;

        Ok((link, repos))
    }

    /// Total number of repositories `username` has starred.
    pub async fn starred_count(&self, username: &str) -> Result<usize, StargazeError> {
        let (link, repos) = self.get_starred(username, None, 1).await?;
        let count = link
            .as_deref()
            .and_then(|link| link_page(link, "last"))
            .unwrap_or(repos.len());
        Ok(count)
    }

    pub async fn starred_page(
        &self,
        username: &str,
        page: u32,
        per_page: u32,
    ) -> Result<StarredPage, StargazeError> {
        let (link, repos) = self.get_starred(username, Some(page), per_page).await?;
        let has_next = link
            .as_deref()
            .map(|link| link_rel(link, "next").is_some())
            .unwrap_or(false);
        Ok(StarredPage { repos, has_next })
    }

    /// Decoded README for `full_name`, or `None` when there is none or it
    /// cannot be read.
    pub async fn fetch_readme(&self, full_name: &str) -> Option<String> {
        log::info!("Fetching README for repository: {}", full_name);
        let url = format!("{}/repos/{}/readme", self.api_base_url, full_name);

        let response = match self.client.get(&url).headers(self.headers()).send().await {
            Ok(response) => response,
            Err(e) => {
                log::error!("Error fetching README for {}: {}", full_name, e);
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            log::warn!("README not found for {}", full_name);
            return None;
        }

        let body: ReadmeResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                log::error!("Error reading README for {}: {}", full_name, e);
                return None;
            }
        };

        match decode_readme(&body.content) {
            Some(text) => {
                log::info!("Successfully fetched README for {}", full_name);
                Some(text)
            }
            None => {
                log::warn!("README for {} is not valid base64 UTF-8", full_name);
                None
            }
        }
    }
}

/// Decode GitHub's line-wrapped base64 contents as UTF-8.
pub fn decode_readme(content: &str) -> Option<String> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .ok()?;
    String::from_utf8(bytes).ok()
}

/// URL of the link with the given `rel` in a `Link` header.
pub fn link_rel<'a>(link: &'a str, rel: &str) -> Option<&'a str> {
    let wanted = format!("rel=\"{}\"", rel);
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        if !params.split(';').any(|p| p.trim() == wanted) {
            return None;
        }
        Some(target.trim().trim_start_matches('<').trim_end_matches('>'))
    })
}

/// `page` query parameter of the link with the given `rel`.
pub fn link_page(link: &str, rel: &str) -> Option<usize> {
    let url = link_rel(link, rel)?;
    let (_, query) = url.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key == "page" {
            value.parse().ok()
        } else {
            None
        }
    })
}
