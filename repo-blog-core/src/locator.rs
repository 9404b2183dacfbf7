//! Resolves the surface forms a user may type for a repository into the
//! canonical `owner/name` identifier. Pure: no I/O.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::LocatorError;

/// Canonical `owner/name` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryLocator {
    full_name: String,
    split: usize,
}

impl RepositoryLocator {
    fn new(owner: &str, name: &str) -> Self {
        Self {
            full_name: format!("{owner}/{name}"),
            split: owner.len(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.full_name[..self.split]
    }

    pub fn name(&self) -> &str {
        &self.full_name[self.split + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.full_name
    }
}

impl fmt::Display for RepositoryLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

impl std::str::FromStr for RepositoryLocator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve(s)
    }
}

fn patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        // Tried in order; the first match wins.
        [
            // https://host/owner/repo[.git][/]
            r"^(?:https?://)?[A-Za-z0-9.-]+\.[A-Za-z]{2,}(?::\d+)?/([^/\s]+)/([^/\s]+?)/?$",
            // https://host/owner/repo/tree/main/...
            r"^(?:https?://)?[A-Za-z0-9.-]+\.[A-Za-z]{2,}(?::\d+)?/([^/\s]+)/([^/\s]+)/",
            // git@host:owner/repo.git
            r"^git@[^:\s]+:([^/\s]+)/([^/\s]+?)/?$",
            // owner/repo
            r"^([^/\s:]+)/([^/\s]+)$",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("locator pattern is valid"))
        .collect()
    })
}

/// Resolve `input` to its canonical form.
///
/// Idempotent: resolving an already canonical `owner/name` returns it
/// unchanged.
pub fn resolve(input: &str) -> Result<RepositoryLocator, LocatorError> {
    let trimmed = input.trim();
    for pattern in patterns() {
        let Some(caps) = pattern.captures(trimmed) else {
            continue;
        };
        let owner = &caps[1];
        let name = caps[2].trim_end_matches(".git");
        if owner.is_empty() || name.is_empty() {
            break;
        }
        let locator = RepositoryLocator::new(owner, name);
        tracing::debug!(input = %trimmed, resolved = %locator, "Resolved repository locator");
        return Ok(locator);
    }
    Err(LocatorError::InvalidLocator {
        input: input.to_string(),
    })
}
