//! # contract: service seams for the blog pipeline
//!
//! The pipeline talks to three external collaborators, each behind one
//! async trait defined here:
//!
//! - [`ContentSource`]: a repository host that lists directories, returns
//!   file bodies and repository metadata (GitHub in production).
//! - [`TextGenerator`]: a chat-style text-generation service, with an
//!   incremental streaming variant.
//! - [`ArticleClient`]: a publishing platform's article API.
//!
//! A fourth seam, [`Sleeper`], exists so retry backoff can be observed in
//! tests without waiting on real timers.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`; the mocks are exported behind
//!   the default `test-export-mocks` feature so integration tests under
//!   `tests/` can build them.
//!
//! ## Type Sources
//! - Request and response types are plain owned data so the mocks need no
//!   lifetime plumbing.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::{GenerationError, PublishError, ScanError};

/// A documentation file fetched from the repository. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentationFile {
    pub path: String,
    pub name: String,
    pub content: String,
    pub size: u64,
    pub url: String,
}

impl DocumentationFile {
    /// Number of `/` separators in the path.
    pub fn depth(&self) -> usize {
        self.path.matches('/').count()
    }
}

/// Snapshot of repository metadata taken at scan time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepositoryMetadata {
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub url: String,
    pub homepage: String,
    pub language: String,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub topics: Vec<String>,
    pub license: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Kind of an entry in a repository directory listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Symlinks, submodules and anything else the scanner does not follow.
    Other,
}

/// One entry of a directory listing as returned by the content source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub path: String,
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
    pub html_url: String,
}

/// Repository host: lists directories and reads files and metadata.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Remaining request quota for the current credentials.
    async fn rate_limit_remaining(&self) -> Result<u64, ScanError>;

    /// Metadata for `owner/name`.
    async fn repository(&self, full_name: &str) -> Result<RepositoryMetadata, ScanError>;

    /// Direct children of `path` (`""` is the repository root).
    async fn list_directory(
        &self,
        full_name: &str,
        path: &str,
    ) -> Result<Vec<RemoteEntry>, ScanError>;

    /// Decoded UTF-8 body of a file entry.
    async fn read_file(&self, full_name: &str, path: &str) -> Result<String, ScanError>;
}

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A single generation call: model identifier plus ordered messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

/// Text fragments in the order the service emits them.
pub type FragmentStream = BoxStream<'static, Result<String, GenerationError>>;

/// Chat-style text generation service.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete the conversation and return the whole reply.
    async fn chat(&self, request: ChatRequest) -> Result<String, GenerationError>;

    /// Start a streamed completion. The returned stream is lazy, finite and
    /// cannot be restarted.
    async fn chat_stream(&self, request: ChatRequest) -> Result<FragmentStream, GenerationError>;
}

/// Everything needed to create an article on the publishing platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleDraft {
    pub title: String,
    pub body_markdown: String,
    pub published: bool,
    pub tags: Vec<String>,
    pub series: Option<String>,
    pub canonical_url: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
}

/// Partial update of an existing article; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub body_markdown: Option<String>,
    pub published: Option<bool>,
    pub tags: Option<Vec<String>>,
}

/// What the platform reports back for a created or fetched article.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PublishedArticle {
    pub id: u64,
    pub url: String,
    pub published: bool,
    pub title: String,
}

/// Publishing platform's article API.
///
/// Implementations perform exactly one HTTP exchange per call; retrying is
/// the caller's business (see [`crate::publish::Publisher`]).
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ArticleClient: Send + Sync {
    async fn create_article(&self, draft: ArticleDraft) -> Result<PublishedArticle, PublishError>;

    async fn update_article(
        &self,
        id: u64,
        update: ArticleUpdate,
    ) -> Result<PublishedArticle, PublishError>;

    async fn get_article(&self, id: u64) -> Result<PublishedArticle, PublishError>;

    async fn list_my_articles(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<PublishedArticle>, PublishError>;
}

/// Waits between retry attempts.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}
