//! Local persistence of formatted posts.
//!
//! Files are named `{repo}_{platform}_{timestamp}.md`. With the default
//! timestamp format names sort lexicographically in creation order.

use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::Local;
use tracing::{debug, error, info, warn};

use crate::error::FileIoError;
use crate::format::Platform;

pub const DEFAULT_OUTPUT_DIR: &str = "generated_content";
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const EXTENSION: &str = "md";

/// Pieces recovered from a stored file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredName {
    pub repo: String,
    pub platform: Platform,
    pub timestamp: String,
}

/// Directory of generated posts.
#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
    timestamp_format: String,
}

impl OutputStore {
    /// Open `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, FileIoError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| FileIoError::write(&dir, e))?;
        debug!(dir = %dir.display(), "[STORE] Output directory ready");
        Ok(Self {
            dir,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        })
    }

    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a post generated now.
    pub fn file_name(&self, repo: &str, platform: Platform) -> String {
        let now = Local::now();
        let mut timestamp = String::new();
        if write!(timestamp, "{}", now.format(&self.timestamp_format)).is_err() {
            warn!(format = %self.timestamp_format, "[STORE] Invalid timestamp format, using default");
            timestamp = now.format(DEFAULT_TIMESTAMP_FORMAT).to_string();
        }
        file_name_at(repo, platform, &timestamp)
    }

    /// Write `content` under a fresh name and return its path.
    pub fn save(
        &self,
        content: &str,
        repo: &str,
        platform: Platform,
    ) -> Result<PathBuf, FileIoError> {
        let path = self.dir.join(self.file_name(repo, platform));
        fs::write(&path, content).map_err(|e| {
            error!(path = %path.display(), error = %e, "[STORE] Failed to save content");
            FileIoError::write(&path, e)
        })?;
        info!(path = %path.display(), "[STORE] Content saved");
        Ok(path)
    }

    pub fn read(&self, path: &Path) -> Result<String, FileIoError> {
        let content = fs::read_to_string(path).map_err(|e| FileIoError::read(path, e))?;
        debug!(path = %path.display(), "[STORE] Read content");
        Ok(content)
    }

    /// Stored posts, newest first, optionally filtered by platform and by
    /// repository name prefix.
    pub fn list(
        &self,
        platform: Option<Platform>,
        repo: Option<&str>,
    ) -> Result<Vec<PathBuf>, FileIoError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| FileIoError::read(&self.dir, e))?;
        let platform_marker = platform.map(|p| format!("_{p}_"));

        let mut files: Vec<(SystemTime, PathBuf)> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| FileIoError::read(&self.dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if platform_marker.as_deref().is_some_and(|m| !name.contains(m)) {
                continue;
            }
            if repo.is_some_and(|r| !name.starts_with(&short_repo_name(r))) {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((modified, path));
        }

        files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
        Ok(files.into_iter().map(|(_, path)| path).collect())
    }

    /// Newest stored post matching the filters.
    pub fn latest(
        &self,
        platform: Option<Platform>,
        repo: Option<&str>,
    ) -> Result<Option<PathBuf>, FileIoError> {
        Ok(self.list(platform, repo)?.into_iter().next())
    }
}

/// Repository part of a file name: the owner prefix is dropped and spaces
/// become underscores.
pub fn short_repo_name(repo: &str) -> String {
    repo.rsplit('/').next().unwrap_or(repo).replace(' ', "_")
}

pub fn file_name_at(repo: &str, platform: Platform, timestamp: &str) -> String {
    format!("{}_{platform}_{timestamp}.{EXTENSION}", short_repo_name(repo))
}

/// Recover repository, platform and timestamp from a stored file name.
pub fn parse_file_name(name: &str) -> Option<StoredName> {
    let stem = name.strip_suffix(".md")?;
    Platform::ALL
        .iter()
        .filter_map(|platform| {
            let marker = format!("_{platform}_");
            stem.rfind(&marker).map(|at| (at, marker.len(), *platform))
        })
        .max_by_key(|(at, _, _)| *at)
        .and_then(|(at, len, platform)| {
            let repo = &stem[..at];
            let timestamp = &stem[at + len..];
            (!repo.is_empty() && !timestamp.is_empty()).then(|| StoredName {
                repo: repo.to_string(),
                platform,
                timestamp: timestamp.to_string(),
            })
        })
}
