use repo_blog::load_config::{
    load_config, load_credentials, ENV_DEVTO_API_KEY, ENV_DEVTO_AUTO_PUBLISH,
    ENV_GENERATION_API_KEY, ENV_GENERATION_HOST, ENV_GENERATION_MODEL, ENV_GITHUB_TOKEN,
};
use repo_blog_core::config::{Settings, DEFAULT_MODEL};
use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn clear_env() {
    for name in [
        ENV_GENERATION_API_KEY,
        ENV_GENERATION_MODEL,
        ENV_GENERATION_HOST,
        ENV_DEVTO_API_KEY,
        ENV_DEVTO_AUTO_PUBLISH,
        ENV_GITHUB_TOKEN,
    ] {
        env::remove_var(name);
    }
}

fn config_file(yaml: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), yaml).unwrap();
    file
}

/// A partial file keeps its own values and takes defaults for the rest.
#[test]
#[serial]
fn test_partial_config_fills_defaults() {
    clear_env();
    let file = config_file(
        r#"
github:
  include_patterns: ["*.md", "*.rst"]
content:
  tone: casual
  max_tags: 3
output:
  directory: ./tmp/posts
attribution:
  enabled: false
  author_note: "Thanks for reading!"
"#,
    );

    let settings = load_config(file.path()).expect("config should load");
    let defaults = Settings::default();

    assert_eq!(settings.github.include_patterns, vec!["*.md", "*.rst"]);
    assert_eq!(settings.github.exclude_patterns, defaults.github.exclude_patterns);
    assert_eq!(settings.content.tone, "casual");
    assert_eq!(settings.content.max_tags, 3);
    assert_eq!(settings.content.target_length, defaults.content.target_length);
    assert_eq!(settings.output.directory, PathBuf::from("./tmp/posts"));
    assert_eq!(settings.output.timestamp_format, defaults.output.timestamp_format);
    assert!(!settings.attribution.enabled);
    assert_eq!(settings.attribution.author_note.as_deref(), Some("Thanks for reading!"));
    assert_eq!(settings.generation.model, DEFAULT_MODEL);
}

#[test]
#[serial]
fn test_missing_or_empty_file_uses_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let settings = load_config(dir.path().join("absent.yaml")).expect("defaults");
    assert_eq!(settings, Settings::default());

    let empty = config_file("   \n");
    assert_eq!(load_config(empty.path()).unwrap(), Settings::default());
}

#[test]
#[serial]
fn test_invalid_yaml_is_reported() {
    clear_env();
    let file = config_file("not-yaml: [:::");
    let err = load_config(file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );

    let wrong_type = config_file("content:\n  max_tags: many\n");
    assert!(load_config(wrong_type.path()).is_err());
}

#[test]
#[serial]
fn test_environment_overrides_model_and_host() {
    clear_env();
    let file = config_file("generation:\n  model: from-file\n  host: http://file-host\n");

    env::set_var(ENV_GENERATION_MODEL, "from-env");
    env::set_var(ENV_GENERATION_HOST, "  ");
    let settings = load_config(file.path()).unwrap();
    assert_eq!(settings.generation.model, "from-env");
    // Blank values are ignored.
    assert_eq!(settings.generation.host, "http://file-host");
    clear_env();
}

#[test]
#[serial]
fn test_credentials_from_environment() {
    clear_env();
    let credentials = load_credentials();
    assert_eq!(credentials.generation_api_key, None);
    assert!(!credentials.devto_auto_publish);

    env::set_var(ENV_GENERATION_API_KEY, " key-123 ");
    env::set_var(ENV_DEVTO_API_KEY, "devto-key");
    env::set_var(ENV_DEVTO_AUTO_PUBLISH, "TRUE");
    env::set_var(ENV_GITHUB_TOKEN, "your_github_token_here");
    let credentials = load_credentials();
    assert_eq!(credentials.generation_api_key.as_deref(), Some("key-123"));
    assert_eq!(credentials.devto_api_key.as_deref(), Some("devto-key"));
    assert!(credentials.devto_auto_publish);
    assert_eq!(credentials.github_token, None, "placeholder token is ignored");

    let shown = format!("{credentials:?}");
    assert!(!shown.contains("key-123") && !shown.contains("devto-key"));

    env::set_var(ENV_DEVTO_AUTO_PUBLISH, "yes");
    env::set_var(ENV_GITHUB_TOKEN, "ghp_real");
    let credentials = load_credentials();
    assert!(!credentials.devto_auto_publish);
    assert_eq!(credentials.github_token.as_deref(), Some("ghp_real"));
    clear_env();
}
