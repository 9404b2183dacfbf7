//! Error taxonomy for every pipeline stage.
//!
//! Each stage owns one error type. [`PipelineError`] wraps them with the
//! stage name so a caller can log and abort without inspecting causes.
//! Transient failures report themselves through `is_retryable`, which the
//! retry loop in [`crate::retry`] consults.

use std::path::PathBuf;

use thiserror::Error;

/// The repository reference did not match any accepted shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    #[error("invalid repository locator: {input:?}")]
    InvalidLocator { input: String },
}

/// Fatal failure while scanning a repository.
///
/// Subtree listing failures never surface as this type; the scanner
/// downgrades them to warnings.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Locator(#[from] LocatorError),
    #[error("repository not found: {0}")]
    NotFound(String),
    #[error("repository access denied: {0}")]
    Unauthorized(String),
    #[error("API rate limit exhausted: {0}")]
    RateLimited(String),
    #[error("repository API returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error("repository request failed: {0}")]
    Transport(String),
    #[error("could not decode repository response: {0}")]
    Decode(String),
}

/// The text-generation service failed.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// Timeouts, connection resets, 429 and 5xx responses.
    #[error("generation service unavailable: {0}")]
    Transient(String),
    #[error("generation service rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("could not decode generation response: {0}")]
    Decode(String),
    #[error("generation failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

impl GenerationError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::Transient(_))
    }
}

/// A local file could not be read or written.
#[derive(Debug, Error)]
#[error("{action} {path}: {source}")]
pub struct FileIoError {
    pub action: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl FileIoError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            action: "failed to read",
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            action: "failed to write",
            path: path.into(),
            source,
        }
    }
}

/// The publishing service rejected the request or could not be reached.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Non-success HTTP status, with the response body kept for remediation.
    #[error("publishing service returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error("publishing request failed: {0}")]
    Transport(String),
    #[error("could not decode publishing response: {0}")]
    Decode(String),
    #[error("publish failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<PublishError>,
    },
    #[error("invalid document metadata: {0}")]
    Metadata(String),
    #[error(transparent)]
    File(#[from] FileIoError),
}

impl PublishError {
    /// 429, 5xx and transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            PublishError::Http { status, .. } => *status == 429 || *status >= 500,
            PublishError::Transport(_) => true,
            _ => false,
        }
    }

    /// Status and body of the failing response, if the failure was an HTTP one.
    pub fn response(&self) -> Option<(u16, &str)> {
        match self {
            PublishError::Http { status, body } => Some((*status, body.as_str())),
            PublishError::Exhausted { last, .. } => last.response(),
            _ => None,
        }
    }
}

/// Terminal failure of a generation run, tagged with the stage that failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("[resolve] {0}")]
    Locator(#[from] LocatorError),
    #[error("[scan] {0}")]
    Scan(#[from] ScanError),
    #[error("[generate] {0}")]
    Generation(#[from] GenerationError),
    #[error("[store] {0}")]
    File(#[from] FileIoError),
    #[error("[pipeline] {0}")]
    Invalid(String),
}

impl PipelineError {
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Locator(_) => "resolve",
            PipelineError::Scan(_) => "scan",
            PipelineError::Generation(_) => "generate",
            PipelineError::File(_) => "store",
            PipelineError::Invalid(_) => "pipeline",
        }
    }
}
