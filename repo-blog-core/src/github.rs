//! GitHub REST v3 implementation of [`ContentSource`].

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::contract::{ContentSource, EntryKind, RemoteEntry, RepositoryMetadata};
use crate::error::ScanError;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

pub struct GitHubClient {
    http: Client,
    base_url: Url,
}

impl GitHubClient {
    /// Build a client. Without a token requests are anonymous and subject
    /// to the much lower unauthenticated quota.
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self, ScanError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ScanError::Transport(format!("invalid API base URL {base_url:?}: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("repo-blog"));
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ScanError::Transport(format!("invalid token header: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ScanError::Transport(e.to_string()))?;

        info!(base_url = %base_url, authenticated = token.is_some(), "Initialized GitHub client");
        Ok(Self { http, base_url })
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, ScanError> {
        let mut url = self.base_url.clone();
        let base = self.base_url.as_str();
        url.path_segments_mut()
            .map_err(|_| ScanError::Transport(format!("API base URL cannot be a base: {base}")))?
            .pop_if_empty()
            .extend(segments.into_iter().filter(|s| !s.is_empty()));
        Ok(url)
    }

    fn repo_endpoint(&self, full_name: &str, tail: &[&str]) -> Result<Url, ScanError> {
        let (owner, repo) = full_name
            .split_once('/')
            .ok_or_else(|| ScanError::NotFound(full_name.to_string()))?;
        self.endpoint(["repos", owner, repo].into_iter().chain(tail.iter().copied()))
    }

    async fn get(&self, url: Url) -> Result<Response, ScanError> {
        debug!(url = %url, "GitHub GET");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ScanError::Transport(e.to_string()))?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(classify(url, response).await)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: Url) -> Result<T, ScanError> {
        self.get(url)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ScanError::Decode(e.to_string()))
    }
}

async fn classify(url: Url, response: Response) -> ScanError {
    let status = response.status();
    let quota_spent = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "0");
    let body = response.text().await.unwrap_or_default();
    error!(url = %url, status = %status, "GitHub API returned error");
    match status {
        StatusCode::NOT_FOUND => ScanError::NotFound(url.path().to_string()),
        StatusCode::UNAUTHORIZED => ScanError::Unauthorized(body),
        StatusCode::TOO_MANY_REQUESTS => ScanError::RateLimited(body),
        StatusCode::FORBIDDEN if quota_spent => ScanError::RateLimited(body),
        StatusCode::FORBIDDEN => ScanError::Unauthorized(body),
        _ => ScanError::Http {
            status: status.as_u16(),
            body,
        },
    }
}

#[derive(Deserialize)]
struct RateLimitResponse {
    resources: RateLimitResources,
}

#[derive(Deserialize)]
struct RateLimitResources {
    core: RateLimitBucket,
}

#[derive(Deserialize)]
struct RateLimitBucket {
    remaining: u64,
}

#[derive(Deserialize)]
struct RepoResponse {
    name: String,
    full_name: String,
    description: Option<String>,
    html_url: String,
    homepage: Option<String>,
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    open_issues_count: u64,
    topics: Option<Vec<String>>,
    license: Option<LicenseResponse>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct LicenseResponse {
    name: String,
}

#[derive(Deserialize)]
struct TopicsResponse {
    names: Vec<String>,
}

#[derive(Deserialize)]
struct ContentEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: u64,
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct FileResponse {
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
    download_url: Option<String>,
}

#[async_trait]
impl ContentSource for GitHubClient {
    async fn rate_limit_remaining(&self) -> Result<u64, ScanError> {
        let url = self.endpoint(["rate_limit"])?;
        let limits: RateLimitResponse = self.get_json(url).await?;
        Ok(limits.resources.core.remaining)
    }

    async fn repository(&self, full_name: &str) -> Result<RepositoryMetadata, ScanError> {
        let url = self.repo_endpoint(full_name, &[])?;
        let repo: RepoResponse = self.get_json(url).await?;

        let topics = match repo.topics {
            Some(topics) => topics,
            None => {
                let url = self.repo_endpoint(full_name, &["topics"])?;
                self.get_json::<TopicsResponse>(url).await?.names
            }
        };

        debug!(repo = %repo.full_name, "Repository metadata fetched");
        Ok(RepositoryMetadata {
            name: repo.name,
            full_name: repo.full_name,
            description: repo.description.unwrap_or_default(),
            url: repo.html_url,
            homepage: repo.homepage.unwrap_or_default(),
            language: repo.language.unwrap_or_default(),
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            open_issues: repo.open_issues_count,
            topics,
            license: repo.license.map(|l| l.name).unwrap_or_default(),
            created_at: repo.created_at,
            updated_at: repo.updated_at,
        })
    }

    async fn list_directory(
        &self,
        full_name: &str,
        path: &str,
    ) -> Result<Vec<RemoteEntry>, ScanError> {
        let mut tail = vec!["contents"];
        tail.extend(path.split('/'));
        let url = self.repo_endpoint(full_name, &tail)?;
        let entries: Vec<ContentEntry> = self.get_json(url).await?;
        Ok(entries
            .into_iter()
            .map(|e| RemoteEntry {
                kind: match e.kind.as_str() {
                    "file" => EntryKind::File,
                    "dir" => EntryKind::Dir,
                    _ => EntryKind::Other,
                },
                path: e.path,
                name: e.name,
                size: e.size,
                html_url: e.html_url.unwrap_or_default(),
            })
            .collect())
    }

    async fn read_file(&self, full_name: &str, path: &str) -> Result<String, ScanError> {
        let mut tail = vec!["contents"];
        tail.extend(path.split('/'));
        let url = self.repo_endpoint(full_name, &tail)?;
        let file: FileResponse = self.get_json(url).await?;

        if file.encoding == "base64" && !file.content.is_empty() {
            let packed: String = file.content.split_whitespace().collect();
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(packed)
                .map_err(|e| ScanError::Decode(format!("{path}: {e}")))?;
            return String::from_utf8(bytes).map_err(|e| ScanError::Decode(format!("{path}: {e}")));
        }

        // Large files come back without inline content.
        match file.download_url {
            Some(raw) => {
                let url = Url::parse(&raw).map_err(|e| ScanError::Decode(e.to_string()))?;
                self.get(url)
                    .await?
                    .text()
                    .await
                    .map_err(|e| ScanError::Decode(e.to_string()))
            }
            None => Err(ScanError::Decode(format!("{path}: no content returned"))),
        }
    }
}
