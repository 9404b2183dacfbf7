//! Platform-specific document shapes, tag handling and the attribution
//! footer.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::contract::RepositoryMetadata;
use crate::frontmatter::ArticleFrontMatter;

/// Most tags the developer blog platform accepts on one article.
pub const MAX_TAGS: usize = 4;

const FILLER_TAGS: [&str; 3] = ["opensource", "github", "project"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Platform {
    Devto,
    Medium,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Devto, Platform::Medium];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Devto => "devto",
            Platform::Medium => "medium",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devto" | "dev.to" => Ok(Platform::Devto),
            "medium" => Ok(Platform::Medium),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

/// Parse a comma-separated platform list, skipping unknown names with a
/// warning and dropping repeats.
pub fn parse_platforms(list: &str) -> Vec<Platform> {
    let mut platforms = Vec::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match name.parse::<Platform>() {
            Ok(p) if !platforms.contains(&p) => platforms.push(p),
            Ok(_) => {}
            Err(e) => warn!(platform = %name, "[FORMAT] Skipping {e}"),
        }
    }
    platforms
}

/// A post shaped for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedDocument {
    pub platform: Platform,
    pub title: String,
    /// Complete file text, frontmatter or heading included.
    pub body: String,
    pub tags: Vec<String>,
    pub canonical_url: Option<String>,
    pub published: bool,
    pub saved_to: Option<PathBuf>,
}

impl FormattedDocument {
    /// Append the attribution footer to the body.
    pub fn append_footer(&mut self, footer: &FooterOptions) {
        self.body = add_footer(&self.body, footer);
    }
}

/// Optional metadata for the developer blog shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DevtoOptions {
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub canonical_url: Option<String>,
    pub published: bool,
    pub series: Option<String>,
    pub cover_image: Option<String>,
}

/// Cap `tags` at [`MAX_TAGS`], keeping the first ones.
pub fn cap_tags(mut tags: Vec<String>) -> Vec<String> {
    if tags.len() > MAX_TAGS {
        warn!(
            count = tags.len(),
            max = MAX_TAGS,
            "[FORMAT] Too many tags, truncating"
        );
        tags.truncate(MAX_TAGS);
    }
    tags
}

/// Frontmatter block followed by the body.
pub fn format_for_devto(
    body: &str,
    title: &str,
    options: DevtoOptions,
) -> Result<FormattedDocument, serde_yaml::Error> {
    let tags = cap_tags(options.tags);
    let meta = ArticleFrontMatter {
        title: title.to_string(),
        published: options.published,
        description: options.description.filter(|s| !s.is_empty()),
        tags: tags.clone(),
        canonical_url: options.canonical_url.clone().filter(|s| !s.is_empty()),
        series: options.series.filter(|s| !s.is_empty()),
        cover_image: options.cover_image.filter(|s| !s.is_empty()),
        extra: Default::default(),
    };
    let text = meta.render(body)?;
    info!("[FORMAT] Formatted content for dev.to");
    Ok(FormattedDocument {
        platform: Platform::Devto,
        title: title.to_string(),
        body: text,
        tags,
        canonical_url: meta.canonical_url,
        published: options.published,
        saved_to: None,
    })
}

/// Heading, optional emphasized subtitle, body and a plain tag line.
pub fn format_for_medium(
    body: &str,
    title: &str,
    subtitle: Option<&str>,
    tags: &[String],
) -> FormattedDocument {
    let mut sections = vec![format!("# {title}"), String::new()];
    if let Some(subtitle) = subtitle.filter(|s| !s.is_empty()) {
        sections.push(format!("*{subtitle}*"));
        sections.push(String::new());
    }
    sections.push(body.to_string());
    if !tags.is_empty() {
        sections.push(String::new());
        sections.push("---".to_string());
        sections.push(String::new());
        sections.push(format!("*Tags: {}*", tags.join(", ")));
    }
    info!("[FORMAT] Formatted content for Medium");
    FormattedDocument {
        platform: Platform::Medium,
        title: title.to_string(),
        body: sections.join("\n"),
        tags: tags.to_vec(),
        canonical_url: None,
        published: false,
        saved_to: None,
    }
}

/// Normalize a tag to lowercase `[a-z0-9-]` with single inner hyphens.
///
/// Whitespace becomes a hyphen, other characters are dropped. Idempotent.
pub fn clean_tag(tag: &str) -> String {
    let mut out = String::with_capacity(tag.len());
    let mut pending_hyphen = false;
    for c in tag.chars().flat_map(char::to_lowercase) {
        match c {
            'a'..='z' | '0'..='9' => {
                if pending_hyphen && !out.is_empty() {
                    out.push('-');
                }
                pending_hyphen = false;
                out.push(c);
            }
            '-' => pending_hyphen = true,
            c if c.is_whitespace() => pending_hyphen = true,
            _ => {}
        }
    }
    out
}

/// Tags for a post: repository topics, then the primary language, then
/// filler tags until `max` is reached. Normalized, deduplicated and in
/// that order.
pub fn extract_tags(_body: &str, metadata: &RepositoryMetadata, max: usize) -> Vec<String> {
    let candidates = metadata
        .topics
        .iter()
        .map(String::as_str)
        .chain(Some(metadata.language.as_str()))
        .chain(FILLER_TAGS);

    let mut tags: Vec<String> = Vec::with_capacity(max);
    for candidate in candidates {
        if tags.len() >= max {
            break;
        }
        let tag = clean_tag(candidate);
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    debug!(?tags, "[FORMAT] Extracted tags");
    tags
}

/// Contents of the attribution footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterOptions {
    pub repo_url: Option<String>,
    pub author_note: Option<String>,
    pub model_name: Option<String>,
    /// Link to this tool's own repository.
    pub tool_url: Option<String>,
    pub include_attribution: bool,
}

impl Default for FooterOptions {
    fn default() -> Self {
        Self {
            repo_url: None,
            author_note: None,
            model_name: None,
            tool_url: None,
            include_attribution: true,
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Append the footer to `body`, separated by a blank line.
pub fn add_footer(body: &str, options: &FooterOptions) -> String {
    let mut parts = vec!["---".to_string(), String::new()];

    if let Some(url) = present(&options.repo_url) {
        parts.push(format!("**🔗 Repository:** {url}"));
        parts.push(String::new());
    }
    if let Some(note) = present(&options.author_note) {
        parts.push(note.to_string());
        parts.push(String::new());
    }

    if options.include_attribution {
        parts.push("## 🤖 About This Post".to_string());
        parts.push(String::new());
        parts.push(match present(&options.tool_url) {
            Some(url) => format!(
                "This post was generated automatically by [**repo-blog**]({url}), a tool that \
                 turns GitHub repositories into blog posts."
            ),
            None => "This post was generated automatically by **repo-blog**, a tool that turns \
                     GitHub repositories into blog posts."
                .to_string(),
        });
        parts.push(String::new());
        parts.push(match present(&options.model_name) {
            Some(model) => format!("**🧠 AI Model:** `{model}` via [Ollama](https://ollama.com)"),
            None => "**🧠 AI Model:** Powered by [Ollama](https://ollama.com)".to_string(),
        });
    }

    format!("{body}\n\n{}", parts.join("\n").trim_end())
}

/// Split a leading `# ` heading off `body`.
///
/// Leading blank lines are skipped. When the first non-blank line is a
/// top-level heading, returns the rest with its leading blank lines removed
/// and the heading text; otherwise returns `body` unchanged and `None`.
pub fn strip_title(body: &str) -> (String, Option<String>) {
    let mut lines = body.split('\n').skip_while(|l| l.trim().is_empty());
    let Some(first) = lines.next() else {
        return (body.to_string(), None);
    };
    let Some(title) = first.trim().strip_prefix("# ") else {
        return (body.to_string(), None);
    };
    let title = title.trim().to_string();
    let rest: Vec<&str> = lines.skip_while(|l| l.trim().is_empty()).collect();
    debug!(title = %title, "[FORMAT] Extracted title from content");
    (rest.join("\n"), Some(title))
}

/// Prepend a header image.
pub fn add_header_image(body: &str, image_url: &str) -> String {
    format!("![Header Image]({image_url})\n\n{body}")
}
