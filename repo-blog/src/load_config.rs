/// `load_config` module: reads the static YAML settings file and the secrets
/// held in the environment.
///
/// This is the only place where user-supplied YAML and environment
/// variables are parsed. Everything downstream receives plain
/// [`Settings`] and [`Credentials`] values.
///
/// # Responsibilities
/// - Parse the YAML file into [`Settings`], accepting partial files
/// - Fall back to defaults, with a warning, when the file does not exist
/// - Apply environment overrides for the generation model and host
/// - Collect API keys and tokens into [`Credentials`]
///
/// # Errors
/// Unreadable or unparsable files are `anyhow::Error`s surfaced at the CLI
/// boundary. Missing secrets are not errors here; commands that need them
/// check for themselves.
use anyhow::Result;
use repo_blog_core::config::{Credentials, Settings};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{error, info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

pub const ENV_GENERATION_API_KEY: &str = "OLLAMA_API_KEY";
pub const ENV_GENERATION_MODEL: &str = "OLLAMA_MODEL";
pub const ENV_GENERATION_HOST: &str = "OLLAMA_HOST";
pub const ENV_DEVTO_API_KEY: &str = "DEVTO_API_KEY";
pub const ENV_DEVTO_AUTO_PUBLISH: &str = "DEVTO_AUTO_PUBLISH";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";

const GITHUB_TOKEN_PLACEHOLDER: &str = "your_github_token_here";

/// Load settings from `path`, then apply environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let mut settings = match fs::read_to_string(path_ref) {
        Ok(content) if content.trim().is_empty() => {
            warn!(config_path = ?path_ref, "Config file is empty, using defaults");
            Settings::default()
        }
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(settings) => {
                info!(config_path = ?path_ref, "Parsed config YAML successfully");
                settings
            }
            Err(e) => {
                error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                return Err(anyhow::anyhow!(
                    "Failed to parse config YAML {:?}: {e}",
                    path_ref
                ));
            }
        },
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(config_path = ?path_ref, "Config file not found, using defaults");
            Settings::default()
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    apply_env_overrides(&mut settings);
    settings.trace_loaded();
    Ok(settings)
}

/// `OLLAMA_MODEL` and `OLLAMA_HOST` take precedence over the file.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Some(model) = read_env(ENV_GENERATION_MODEL) {
        info!(model = %model, "Generation model overridden from environment");
        settings.generation.model = model;
    }
    if let Some(host) = read_env(ENV_GENERATION_HOST) {
        info!(host = %host, "Generation host overridden from environment");
        settings.generation.host = host;
    }
}

/// Secrets from the environment. Call after `dotenvy` has run.
pub fn load_credentials() -> Credentials {
    let github_token = read_env(ENV_GITHUB_TOKEN)
        .filter(|t| !t.to_lowercase().contains(GITHUB_TOKEN_PLACEHOLDER));
    let credentials = Credentials {
        generation_api_key: read_env(ENV_GENERATION_API_KEY),
        devto_api_key: read_env(ENV_DEVTO_API_KEY),
        github_token,
        devto_auto_publish: read_env(ENV_DEVTO_AUTO_PUBLISH)
            .is_some_and(|v| v.eq_ignore_ascii_case("true")),
    };
    info!(?credentials, "Loaded credentials from environment");
    credentials
}

fn read_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
