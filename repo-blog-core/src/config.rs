use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::extract::default_priority_files;
use crate::format::FooterOptions;
use crate::generate::{BodyOptions, DEFAULT_DESCRIPTION_LENGTH};
use crate::github::DEFAULT_API_BASE;
use crate::scan::{ScanOptions, DEFAULT_MAX_FILE_SIZE};
use crate::storage::{DEFAULT_OUTPUT_DIR, DEFAULT_TIMESTAMP_FORMAT};

pub const DEFAULT_MODEL: &str = "gpt-oss:120b-cloud";
pub const DEFAULT_GENERATION_HOST: &str = "https://ollama.com";
pub const DEFAULT_DEVTO_BASE_URL: &str = "https://dev.to/api";

/// Non-secret settings, normally read from YAML. Every field has a default
/// so partial files are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub github: GithubSettings,
    pub content: ContentSettings,
    pub output: OutputSettings,
    pub attribution: AttributionSettings,
    pub generation: GenerationSettings,
    pub devto: DevtoSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubSettings {
    pub api_base_url: String,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub max_file_size: u64,
    pub priority_files: Vec<String>,
}

impl Default for GithubSettings {
    fn default() -> Self {
        let scan = ScanOptions::default();
        Self {
            api_base_url: DEFAULT_API_BASE.to_string(),
            include_patterns: scan.include_patterns,
            exclude_patterns: scan.exclude_patterns,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            priority_files: default_priority_files(),
        }
    }
}

impl GithubSettings {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            include_patterns: self.include_patterns.clone(),
            exclude_patterns: self.exclude_patterns.clone(),
            max_file_size: self.max_file_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSettings {
    pub tone: String,
    pub target_length: u32,
    pub additional_instructions: Option<String>,
    pub description_max_length: usize,
    pub max_tags: usize,
}

impl Default for ContentSettings {
    fn default() -> Self {
        let body = BodyOptions::default();
        Self {
            tone: body.tone,
            target_length: body.target_length,
            additional_instructions: None,
            description_max_length: DEFAULT_DESCRIPTION_LENGTH,
            max_tags: crate::format::MAX_TAGS,
        }
    }
}

impl ContentSettings {
    pub fn body_options(&self) -> BodyOptions {
        BodyOptions {
            tone: self.tone.clone(),
            target_length: self.target_length,
            additional_instructions: self.additional_instructions.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub directory: PathBuf,
    pub timestamp_format: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_OUTPUT_DIR),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributionSettings {
    pub enabled: bool,
    /// Link to this tool, shown in the "about" section.
    pub repo_url: Option<String>,
    pub author_note: Option<String>,
}

impl Default for AttributionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            repo_url: None,
            author_note: None,
        }
    }
}

impl AttributionSettings {
    /// Footer for a post about `project_url`, generated by `model`.
    pub fn footer(&self, project_url: &str, model: &str) -> FooterOptions {
        FooterOptions {
            repo_url: Some(project_url.to_string()),
            author_note: self.author_note.clone(),
            model_name: Some(model.to_string()),
            tool_url: self.repo_url.clone(),
            include_attribution: self.enabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub host: String,
    pub model: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_GENERATION_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevtoSettings {
    pub base_url: String,
    /// Seconds to wait between consecutive publishes.
    pub publish_delay_secs: u64,
}

impl Default for DevtoSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_DEVTO_BASE_URL.to_string(),
            publish_delay_secs: crate::publish::DEFAULT_PUBLISH_DELAY.as_secs(),
        }
    }
}

impl Settings {
    pub fn trace_loaded(&self) {
        info!(
            output_dir = %self.output.directory.display(),
            model = %self.generation.model,
            include_patterns = self.github.include_patterns.len(),
            attribution = self.attribution.enabled,
            "Loaded Settings"
        );
        debug!(?self, "Settings loaded (full debug)");
    }
}

/// Secrets taken from the environment. Never serialized.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub generation_api_key: Option<String>,
    pub devto_api_key: Option<String>,
    pub github_token: Option<String>,
    pub devto_auto_publish: bool,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("generation_api_key", &mask(&self.generation_api_key))
            .field("devto_api_key", &mask(&self.devto_api_key))
            .field("github_token", &mask(&self.github_token))
            .field("devto_auto_publish", &self.devto_auto_publish)
            .finish()
    }
}
