//! Publishing orchestration over an [`ArticleClient`]: tag cap, retry, and
//! loading saved documents back into drafts.

use std::path::Path;
use std::time::Duration;

use tracing::{error, info};

use crate::contract::{
    ArticleClient, ArticleDraft, ArticleUpdate, PublishedArticle, Sleeper,
};
use crate::error::{FileIoError, PublishError};
use crate::format::cap_tags;
use crate::frontmatter::ArticleFrontMatter;
use crate::retry::{with_retry, RetryFailure, RetryPolicy, TokioSleeper};

/// Courtesy pause between consecutive publishes.
pub const DEFAULT_PUBLISH_DELAY: Duration = Duration::from_secs(3);

/// Title used for a saved document whose metadata block has none.
pub const UNTITLED: &str = "Untitled";

pub struct Publisher<C> {
    client: C,
    policy: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
}

impl<C: ArticleClient> Publisher<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            policy: RetryPolicy::default(),
            sleeper: Box::new(TokioSleeper),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    /// Create an article, retrying 429/5xx/transport failures.
    pub async fn publish(&self, mut draft: ArticleDraft) -> Result<PublishedArticle, PublishError> {
        draft.tags = cap_tags(draft.tags);
        info!(title = %draft.title, published = draft.published, "[PUBLISH] Creating article");

        let article = with_retry(
            &self.policy,
            self.sleeper.as_ref(),
            "publish",
            PublishError::is_retryable,
            |_| self.client.create_article(draft.clone()),
        )
        .await
        .map_err(|f| surface("publish", f))?;

        info!(id = article.id, url = %article.url, "[PUBLISH] Article created");
        Ok(article)
    }

    /// Update an existing article, with the same tag cap and retry as
    /// [`Publisher::publish`].
    pub async fn update(
        &self,
        id: u64,
        mut update: ArticleUpdate,
    ) -> Result<PublishedArticle, PublishError> {
        update.tags = update.tags.map(cap_tags);
        info!(id, "[PUBLISH] Updating article");

        let article = with_retry(
            &self.policy,
            self.sleeper.as_ref(),
            "update",
            PublishError::is_retryable,
            |_| self.client.update_article(id, update.clone()),
        )
        .await
        .map_err(|f| surface("update", f))?;

        info!(id = article.id, "[PUBLISH] Article updated");
        Ok(article)
    }

    pub async fn get(&self, id: u64) -> Result<PublishedArticle, PublishError> {
        self.client.get_article(id).await
    }

    pub async fn list_mine(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<PublishedArticle>, PublishError> {
        self.client.list_my_articles(page, per_page).await
    }

    /// Read a saved document and publish it.
    pub async fn publish_file(
        &self,
        path: &Path,
        publish_now: bool,
    ) -> Result<PublishedArticle, PublishError> {
        let draft = load_draft(path, publish_now)?;
        self.publish(draft).await
    }

    /// Pause before the next publish. Never called implicitly.
    pub async fn respect_rate_limit(&self, delay: Duration) {
        info!(delay_secs = delay.as_secs_f64(), "[PUBLISH] Waiting for rate limit");
        self.sleeper.sleep(delay).await;
    }
}

fn surface(stage: &'static str, failure: RetryFailure<PublishError>) -> PublishError {
    error!(stage, attempts = failure.attempts, error = %failure.error, "[PUBLISH] Request failed");
    if failure.exhausted {
        PublishError::Exhausted {
            attempts: failure.attempts,
            last: Box::new(failure.error),
        }
    } else {
        failure.error
    }
}

/// Parse saved document text into a draft.
///
/// `publish_now` forces `published`; otherwise the block's own value is
/// kept. A missing title becomes [`UNTITLED`].
pub fn draft_from_text(text: &str, publish_now: bool) -> Result<ArticleDraft, PublishError> {
    let (meta, body) =
        ArticleFrontMatter::parse(text).map_err(|e| PublishError::Metadata(e.to_string()))?;
    let title = if meta.title.trim().is_empty() {
        UNTITLED.to_string()
    } else {
        meta.title
    };
    Ok(ArticleDraft {
        title,
        body_markdown: body.to_string(),
        published: publish_now || meta.published,
        tags: meta.tags,
        series: meta.series,
        canonical_url: meta.canonical_url,
        description: meta.description,
        cover_image: meta.cover_image,
    })
}

/// Read a saved document from disk into a draft.
pub fn load_draft(path: &Path, publish_now: bool) -> Result<ArticleDraft, PublishError> {
    let text = std::fs::read_to_string(path).map_err(|e| FileIoError::read(path, e))?;
    let draft = draft_from_text(&text, publish_now)?;
    info!(path = %path.display(), title = %draft.title, "[PUBLISH] Loaded document");
    Ok(draft)
}
