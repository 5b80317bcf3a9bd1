use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::fixtures::{Repository, RepositoryFixture};

const DEFAULT_PER_PAGE: usize = 30;
const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct PageParams {
    page: Option<usize>,
    per_page: Option<usize>,
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "github-mock"
    }))
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest"
        })),
    )
        .into_response()
}

fn repository_json(repo: &Repository, id: usize) -> Value {
    json!({
        "id": id,
        "name": repo.name,
        "full_name": repo.full_name(),
        "owner": {
            "login": repo.owner,
            "type": "User"
        },
        "private": false,
        "html_url": format!("https://github.com/{}", repo.full_name()),
        "description": repo.description,
        "language": repo.language,
        "stargazers_count": repo.stargazers_count
    })
}

/// Build a GitHub-style `Link` header for page `page` of `last_page`.
fn link_header(base: &str, page: usize, per_page: usize, last_page: usize) -> Option<String> {
    if last_page <= 1 {
        return None;
    }

    let link = |page: usize, rel: &str| {
        format!(
            "<{}?page={}&per_page={}>; rel=\"{}\"",
            base, page, per_page, rel
        )
    };

    let mut links = Vec::new();
    if page > 1 {
        links.push(link(page - 1, "prev"));
    }
    if page < last_page {
        links.push(link(page + 1, "next"));
        links.push(link(last_page, "last"));
    }
    if page > 1 {
        links.push(link(1, "first"));
    }
    Some(links.join(", "))
}

pub async fn list_starred(
    Path(user): Path<String>,
    Query(params): Query<PageParams>,
    headers: HeaderMap,
    State(fixture): State<Arc<RepositoryFixture>>,
) -> Response {
    let Some(stars) = fixture.starred(&user) else {
        return not_found();
    };

    let per_page = params
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);
    let page = params.page.unwrap_or(1).max(1);
    let last_page = stars.len().div_ceil(per_page).max(1);

    let start = (page - 1) * per_page;
    let items: Vec<Value> = stars
        .iter()
        .enumerate()
        .skip(start)
        .take(per_page)
        .map(|(index, repo)| repository_json(repo, index + 1))
        .collect();

    log::debug!(
        "starred {} page {}/{} ({} items)",
        user,
        page,
        last_page,
        items.len()
    );

    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let base = format!("http://{}/users/{}/starred", host, user);

    let mut response = Json(items).into_response();
    if let Some(link) = link_header(&base, page, per_page, last_page) {
        if let Ok(value) = link.parse() {
            response.headers_mut().insert(header::LINK, value);
        }
    }
    response
}

pub async fn get_readme(
    Path((owner, repo)): Path<(String, String)>,
    State(fixture): State<Arc<RepositoryFixture>>,
) -> Response {
    let Some(readme) = fixture
        .get_repository(&owner, &repo)
        .and_then(|r| r.readme.as_ref())
    else {
        return not_found();
    };

    let content = if readme.encoding == "base64" {
        readme.content.clone()
    } else {
        wrap_base64(&base64::engine::general_purpose::STANDARD.encode(&readme.content))
    };

    Json(json!({
        "type": "file",
        "encoding": "base64",
        "name": "README.md",
        "path": "README.md",
        "size": readme.content.len(),
        "content": content,
        "html_url": format!("https://github.com/{}/{}/blob/main/README.md", owner, repo)
    }))
    .into_response()
}

/// GitHub wraps base64 content at 60 columns.
fn wrap_base64(encoded: &str) -> String {
    encoded
        .as_bytes()
        .chunks(60)
        .map(|line| String::from_utf8_lossy(line).into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_header_first_page() {
        let link = link_header("http://h/users/u/starred", 1, 1, 3).unwrap();
        assert_eq!(
            link,
            "<http://h/users/u/starred?page=2&per_page=1>; rel=\"next\", \
             <http://h/users/u/starred?page=3&per_page=1>; rel=\"last\""
        );
    }

    #[test]
    fn test_link_header_last_page_has_no_next() {
        let link = link_header("http://h/s", 3, 1, 3).unwrap();
        assert!(!link.contains("rel=\"next\""));
        assert!(link.contains("rel=\"prev\""));
        assert!(link.contains("rel=\"first\""));
    }

    #[test]
    fn test_single_page_has_no_link() {
        assert!(link_header("http://h/s", 1, 100, 1).is_none());
    }

    #[test]
    fn test_wrap_base64() {
        let wrapped = wrap_base64(&"A".repeat(130));
        let lines: Vec<&str> = wrapped.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 60);
        assert_eq!(lines[2].len(), 10);
    }
}
