//! Walks a repository's file tree through a [`ContentSource`] and collects
//! the documentation files that pass the include/exclude filters.
//!
//! # Pattern semantics
//! Patterns are a restricted glob: `*` matches any run of characters
//! (including `/`), `?` matches exactly one character, everything else is
//! literal. A pattern matches when it matches a *prefix* of the path, so
//! `docs/*` excludes `docs/a/b.md` and `*.md` includes `guide.md.orig`.
//! Patterns are not anchored at the end of the path and are not applied to
//! basenames.

use std::collections::VecDeque;

use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::contract::{ContentSource, DocumentationFile, EntryKind, RepositoryMetadata};
use crate::error::ScanError;
use crate::locator::RepositoryLocator;

/// Remaining-quota level below which a warning is logged.
pub const RATE_LIMIT_WARNING_THRESHOLD: u64 = 100;

/// 1 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_048_576;

/// Which files to collect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub max_file_size: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_patterns: vec!["*.md".to_string()],
            exclude_patterns: [
                "node_modules/*",
                ".git/*",
                "vendor/*",
                "build/*",
                "dist/*",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// Output of a scan: the collected files and the metadata snapshot.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub files: Vec<DocumentationFile>,
    pub metadata: RepositoryMetadata,
}

/// Compiled prefix-anchored glob.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
}

impl PathPattern {
    pub fn new(pattern: &str) -> Self {
        let mut expr = String::from("^");
        for c in pattern.chars() {
            match c {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                other => expr.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
            }
        }
        let regex = Regex::new(&expr).expect("escaped glob is a valid regex");
        Self {
            source: pattern.to_string(),
            regex,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Does `path` match the glob `pattern`? See the module docs.
pub fn matches_pattern(path: &str, pattern: &str) -> bool {
    PathPattern::new(pattern).matches(path)
}

fn compile(patterns: &[String]) -> Vec<PathPattern> {
    patterns.iter().map(|p| PathPattern::new(p)).collect()
}

fn any_match(patterns: &[PathPattern], path: &str) -> bool {
    patterns.iter().any(|p| p.matches(path))
}

/// Repository scanner bound to one content source.
pub struct Scanner<S> {
    source: S,
}

impl<S: ContentSource> Scanner<S> {
    /// Wrap `source`, logging its remaining rate-limit quota.
    ///
    /// The quota check is observational only; failures to read it are
    /// logged and ignored.
    pub async fn new(source: S) -> Self {
        match source.rate_limit_remaining().await {
            Ok(remaining) if remaining < RATE_LIMIT_WARNING_THRESHOLD => {
                warn!(remaining, "[SCAN] Low repository API rate limit");
            }
            Ok(remaining) => info!(remaining, "[SCAN] Repository API rate limit checked"),
            Err(e) => warn!(error = %e, "[SCAN] Could not check repository API rate limit"),
        }
        Self { source }
    }

    /// Fetch repository metadata and every matching documentation file.
    pub async fn scan(
        &self,
        locator: &RepositoryLocator,
        options: &ScanOptions,
    ) -> Result<ScanResult, ScanError> {
        let full_name = locator.as_str();
        let metadata = self.source.repository(full_name).await.map_err(|e| {
            error!(repo = %full_name, error = %e, "[SCAN] Failed to get repository");
            e
        })?;
        info!(repo = %metadata.full_name, "[SCAN] Found repository");

        let files = self.collect_files(locator, options).await?;
        Ok(ScanResult { files, metadata })
    }

    /// Breadth-first walk from the root, visiting every entry once.
    pub async fn collect_files(
        &self,
        locator: &RepositoryLocator,
        options: &ScanOptions,
    ) -> Result<Vec<DocumentationFile>, ScanError> {
        let full_name = locator.as_str();
        let include = compile(&options.include_patterns);
        let exclude = compile(&options.exclude_patterns);

        let root = self.source.list_directory(full_name, "").await.map_err(|e| {
            error!(repo = %full_name, error = %e, "[SCAN] Error scanning repository");
            e
        })?;
        let mut queue: VecDeque<_> = root.into();
        let mut files = Vec::new();

        while let Some(entry) = queue.pop_front() {
            // Checked before descending so an excluded directory prunes its subtree.
            if any_match(&exclude, &entry.path) {
                debug!(path = %entry.path, "[SCAN] Skipping excluded path");
                continue;
            }

            match entry.kind {
                EntryKind::Dir => {
                    match self.source.list_directory(full_name, &entry.path).await {
                        Ok(children) => queue.extend(children),
                        Err(e) => {
                            warn!(path = %entry.path, error = %e, "[SCAN] Could not access directory");
                        }
                    }
                    continue;
                }
                EntryKind::Other => continue,
                EntryKind::File => {}
            }

            if !any_match(&include, &entry.path) {
                continue;
            }

            if entry.size > options.max_file_size {
                warn!(
                    path = %entry.path,
                    size = entry.size,
                    max = options.max_file_size,
                    "[SCAN] Skipping large file"
                );
                continue;
            }

            match self.source.read_file(full_name, &entry.path).await {
                Ok(content) => {
                    debug!(path = %entry.path, "[SCAN] Found documentation file");
                    files.push(DocumentationFile {
                        path: entry.path,
                        name: entry.name,
                        content,
                        size: entry.size,
                        url: entry.html_url,
                    });
                }
                Err(e) => {
                    warn!(path = %entry.path, error = %e, "[SCAN] Could not read file");
                }
            }
        }

        info!(repo = %full_name, count = files.len(), "[SCAN] Found documentation files");
        Ok(files)
    }
}
