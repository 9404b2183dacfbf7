//! Combines repository metadata and documentation files into the single
//! text blob handed to the generator.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use crate::contract::{DocumentationFile, RepositoryMetadata};
use crate::frontmatter;

/// Per-file body cap, in characters.
pub const MAX_FILE_CHARS: usize = 5000;

/// Appended to a body that was cut at [`MAX_FILE_CHARS`].
pub const TRUNCATION_MARKER: &str = "\n\n[... content truncated ...]";

pub fn default_priority_files() -> Vec<String> {
    vec!["README.md".into(), "README.MD".into(), "readme.md".into()]
}

/// Orders files and renders the combined project document.
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    priority_files: Vec<String>,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new(default_priority_files())
    }
}

/// Sort key: rank, position in the priority list, depth, full path.
type PriorityKey = (u8, usize, usize, String);

impl ContentExtractor {
    pub fn new(priority_files: Vec<String>) -> Self {
        Self { priority_files }
    }

    fn priority_key(&self, file: &DocumentationFile) -> PriorityKey {
        let name = file.name.to_lowercase();
        if let Some(pos) = self
            .priority_files
            .iter()
            .position(|p| p.to_lowercase() == name)
        {
            return (0, pos, file.depth(), file.path.clone());
        }
        if name.contains("readme") {
            return (1, 0, file.depth(), file.path.clone());
        }
        (2, 0, file.depth(), file.path.clone())
    }

    /// Sort `files` into extraction order.
    ///
    /// The key ends in the full path, so the result does not depend on the
    /// input order.
    pub fn sort_by_priority(&self, files: &mut [DocumentationFile]) {
        files.sort_by_cached_key(|f| self.priority_key(f));
    }

    /// Render the metadata header followed by every file, highest priority
    /// first. Output is a pure function of the inputs.
    pub fn extract_project_info(
        &self,
        files: &[DocumentationFile],
        metadata: &RepositoryMetadata,
    ) -> String {
        let mut lines = metadata_header(metadata);

        let mut ordered = files.to_vec();
        self.sort_by_priority(&mut ordered);

        for file in &ordered {
            lines.push(format!("## Content from: {}", file.path));
            lines.push(String::new());

            let (meta, body) = frontmatter::split(&file.content);
            if let Some(meta) = meta.filter(|m| !m.is_empty()) {
                lines.push("**Frontmatter:**".to_string());
                for (key, value) in &meta {
                    lines.push(format!(
                        "- {}: {}",
                        frontmatter::display_value(key),
                        frontmatter::display_value(value)
                    ));
                }
                lines.push(String::new());
            }

            lines.push(truncate_body(body.trim()));
            lines.push(String::new());
            lines.push("---".to_string());
            lines.push(String::new());
            debug!(path = %file.path, "[EXTRACT] Added file");
        }

        let info = lines.join("\n");
        info!(
            repo = %metadata.full_name,
            files = ordered.len(),
            chars = info.chars().count(),
            "[EXTRACT] Combined project info"
        );
        info
    }
}

fn metadata_header(metadata: &RepositoryMetadata) -> Vec<String> {
    let mut lines = vec![
        "# Repository Overview".to_string(),
        format!("**Name:** {}", metadata.full_name),
        format!("**Description:** {}", metadata.description),
        format!("**URL:** {}", metadata.url),
    ];
    if !metadata.homepage.is_empty() {
        lines.push(format!("**Homepage:** {}", metadata.homepage));
    }
    if !metadata.language.is_empty() {
        lines.push(format!("**Primary Language:** {}", metadata.language));
    }
    lines.push(format!(
        "**Stats:** {} stars, {} forks",
        metadata.stars, metadata.forks
    ));
    if !metadata.topics.is_empty() {
        lines.push(format!("**Topics:** {}", metadata.topics.join(", ")));
    }
    if !metadata.license.is_empty() {
        lines.push(format!("**License:** {}", metadata.license));
    }
    lines.push(String::new());
    lines
}

/// Cut `body` at [`MAX_FILE_CHARS`] characters, appending the marker if
/// anything was dropped.
pub fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_FILE_CHARS) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &body[..cut]),
        None => body.to_string(),
    }
}

/// Bodies of fenced code blocks, in document order.
pub fn extract_code_blocks(markdown: &str) -> Vec<String> {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)```[^\n`]*\n(.*?)```").expect("fence pattern is valid")
    });
    fence
        .captures_iter(markdown)
        .map(|c| c[1].to_string())
        .collect()
}

/// An inline markdown link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub text: String,
    pub url: String,
}

/// Inline `[text](url)` links, in document order.
pub fn extract_links(markdown: &str) -> Vec<Link> {
    static LINK: OnceLock<Regex> = OnceLock::new();
    let link = LINK
        .get_or_init(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("link pattern is valid"));
    link.captures_iter(markdown)
        .map(|c| Link {
            text: c[1].to_string(),
            url: c[2].to_string(),
        })
        .collect()
}
