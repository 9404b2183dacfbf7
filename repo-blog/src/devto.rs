//! dev.to articles API client implementing [`ArticleClient`].
//!
//! One HTTP exchange per call, authenticated with the `api-key` header and
//! bounded by a 30 second timeout. Retrying is left to
//! [`repo_blog_core::publish::Publisher`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use repo_blog_core::contract::{ArticleClient, ArticleDraft, ArticleUpdate, PublishedArticle};
use repo_blog_core::error::PublishError;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct DevToClient {
    http: Client,
    base_url: String,
}

impl DevToClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, PublishError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| PublishError::Metadata(format!("invalid API key header: {e}")))?;
        headers.insert("api-key", key);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        info!(base_url = %base_url, "Initialized dev.to client");
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn execute<T: for<'de> Deserialize<'de>>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, PublishError> {
        let response = request
            .send()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "dev.to API returned error");
            return Err(PublishError::Http {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| PublishError::Decode(e.to_string()))
    }
}

#[derive(Serialize)]
struct Envelope<T> {
    article: T,
}

#[derive(Serialize)]
struct NewArticle<'a> {
    title: &'a str,
    published: bool,
    body_markdown: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    series: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    canonical_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cover_image: Option<&'a str>,
}

#[derive(Serialize)]
struct ArticleChanges<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body_markdown: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a [String]>,
}

#[derive(Deserialize)]
struct ArticleResponse {
    id: u64,
    #[serde(default)]
    url: String,
    #[serde(default)]
    published: bool,
    #[serde(default)]
    title: String,
}

impl From<ArticleResponse> for PublishedArticle {
    fn from(a: ArticleResponse) -> Self {
        PublishedArticle {
            id: a.id,
            url: a.url,
            published: a.published,
            title: a.title,
        }
    }
}

#[async_trait]
impl ArticleClient for DevToClient {
    async fn create_article(&self, draft: ArticleDraft) -> Result<PublishedArticle, PublishError> {
        let body = Envelope {
            article: NewArticle {
                title: &draft.title,
                published: draft.published,
                body_markdown: &draft.body_markdown,
                tags: (!draft.tags.is_empty()).then_some(draft.tags.as_slice()),
                series: draft.series.as_deref(),
                canonical_url: draft.canonical_url.as_deref(),
                description: draft.description.as_deref(),
                cover_image: draft.cover_image.as_deref(),
            },
        };
        debug!(title = %draft.title, published = draft.published, tags = ?draft.tags, "POST /articles");
        let article: ArticleResponse = self
            .execute(self.http.post(self.url("/articles")).json(&body))
            .await?;
        Ok(article.into())
    }

    async fn update_article(
        &self,
        id: u64,
        update: ArticleUpdate,
    ) -> Result<PublishedArticle, PublishError> {
        let body = Envelope {
            article: ArticleChanges {
                title: update.title.as_deref(),
                body_markdown: update.body_markdown.as_deref(),
                published: update.published,
                tags: update.tags.as_deref(),
            },
        };
        debug!(id, "PUT /articles/{{id}}");
        let article: ArticleResponse = self
            .execute(self.http.put(self.url(&format!("/articles/{id}"))).json(&body))
            .await?;
        Ok(article.into())
    }

    async fn get_article(&self, id: u64) -> Result<PublishedArticle, PublishError> {
        let article: ArticleResponse = self
            .execute(self.http.get(self.url(&format!("/articles/{id}"))))
            .await?;
        info!(id, title = %article.title, "Retrieved article");
        Ok(article.into())
    }

    async fn list_my_articles(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<PublishedArticle>, PublishError> {
        let request = self
            .http
            .get(self.url("/articles/me"))
            .query(&[("page", page), ("per_page", per_page)]);
        let articles: Vec<ArticleResponse> = self.execute(request).await?;
        info!(count = articles.len(), "Retrieved articles");
        Ok(articles.into_iter().map(Into::into).collect())
    }
}
