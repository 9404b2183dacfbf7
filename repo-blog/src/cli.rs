///
/// This module implements the CLI interface for repo-blog: command parsing,
/// argument validation and the async entrypoint shared by `main` and the
/// integration tests.
///
/// All pipeline logic (scanning, extraction, generation, formatting,
/// publishing) lives in [`repo-blog-core`]. This module only wires concrete
/// clients into it and reports results.
///
/// ## Commands
/// - `generate`: scan a repository and write one post per platform
/// - `publish`: send a saved post to dev.to
/// - `list-files`: show saved posts, newest first
/// - `config-check`: report which settings and secrets are present
///
/// ## How To Use
/// - Command-line users: run the `repo-blog` binary with `--help`.
/// - Programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`repo-blog-core`]: ../../repo-blog-core/
use crate::devto::DevToClient;
use crate::load_config::{
    load_config, load_credentials, DEFAULT_CONFIG_PATH, ENV_DEVTO_API_KEY, ENV_GENERATION_API_KEY,
};
use crate::ollama::OllamaClient;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use repo_blog_core::config::{Credentials, Settings};
use repo_blog_core::format::{parse_platforms, Platform};
use repo_blog_core::generate::ContentGenerator;
use repo_blog_core::github::GitHubClient;
use repo_blog_core::pipeline::{generate_posts, GenerateRequest};
use repo_blog_core::publish::Publisher;
use repo_blog_core::scan::Scanner;
use repo_blog_core::storage::OutputStore;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI for repo-blog: turn a GitHub repository's docs into blog posts.
#[derive(Parser)]
#[clap(
    name = "repo-blog",
    version,
    about = "Generate dev.to and Medium blog posts from a GitHub repository's documentation"
)]
pub struct Cli {
    /// Path to the YAML config file
    #[clap(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate blog posts for a repository (URL or owner/name)
    Generate {
        repo: String,
        /// Comma-separated target platforms
        #[clap(long, short, default_value = "devto,medium")]
        platforms: String,
        /// Output directory (overrides the config file)
        #[clap(long, short)]
        output: Option<PathBuf>,
        /// Print the post body as it is generated
        #[clap(long)]
        stream: bool,
    },
    /// Publish a generated post
    Publish {
        file: PathBuf,
        #[clap(long, short, default_value = "devto")]
        platform: String,
        /// Publish immediately instead of saving a draft
        #[clap(long)]
        publish: bool,
    },
    /// List generated posts, newest first
    ListFiles {
        #[clap(long, short)]
        platform: Option<String>,
        #[clap(long, short)]
        repo: Option<String>,
    },
    /// Check configuration and credentials
    ConfigCheck,
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let settings = load_config(&cli.config)?;
    let credentials = load_credentials();

    match cli.command {
        Commands::Generate {
            repo,
            platforms,
            output,
            stream,
        } => {
            tracing::info!(command = "generate", repo = %repo, "Starting generation");
            generate(&settings, &credentials, repo, &platforms, output, stream).await
        }
        Commands::Publish {
            file,
            platform,
            publish,
        } => {
            tracing::info!(command = "publish", file = %file.display(), "Starting publish");
            publish_file(&settings, &credentials, &file, &platform, publish).await
        }
        Commands::ListFiles { platform, repo } => {
            list_files(&settings, platform.as_deref(), repo.as_deref())
        }
        Commands::ConfigCheck => config_check(&cli.config, &settings, &credentials),
    }
}

/// Echoes streamed fragments to a writer. After the first write error the
/// rest of the stream is dropped; generation itself carries on.
pub struct FragmentEcho<W> {
    out: W,
    broken: bool,
}

impl<W: Write> FragmentEcho<W> {
    pub fn new(out: W) -> Self {
        Self { out, broken: false }
    }

    pub fn push(&mut self, fragment: &str) {
        if self.broken {
            return;
        }
        let written = self
            .out
            .write_all(fragment.as_bytes())
            .and_then(|()| self.out.flush());
        if let Err(e) = written {
            tracing::warn!(error = %e, "Stopped echoing streamed content");
            self.broken = true;
        }
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }
}

async fn generate(
    settings: &Settings,
    credentials: &Credentials,
    repo: String,
    platforms: &str,
    output: Option<PathBuf>,
    stream: bool,
) -> Result<()> {
    let api_key = credentials
        .generation_api_key
        .as_deref()
        .with_context(|| format!("{ENV_GENERATION_API_KEY} not set"))?;

    let platforms = parse_platforms(platforms);
    if platforms.is_empty() {
        bail!("no valid platforms given (expected devto and/or medium)");
    }

    let github = GitHubClient::new(
        &settings.github.api_base_url,
        credentials.github_token.as_deref(),
    )?;
    let scanner = Scanner::new(github).await;
    let ollama = OllamaClient::new(&settings.generation.host, api_key)?;
    let generator = ContentGenerator::new(ollama, settings.generation.model.clone());
    let store = OutputStore::new(output.unwrap_or_else(|| settings.output.directory.clone()))?
        .with_timestamp_format(settings.output.timestamp_format.clone());

    let request = GenerateRequest {
        repository: repo,
        platforms,
    };

    let mut echo = FragmentEcho::new(std::io::stdout());
    let mut print_fragment = |fragment: &str| echo.push(fragment);
    let sink = if stream {
        Some(&mut print_fragment as &mut (dyn FnMut(&str) + Send))
    } else {
        None
    };

    let report = generate_posts(settings, &scanner, &generator, &store, &request, sink)
        .await
        .map_err(|e| {
            tracing::error!(command = "generate", stage = e.stage(), error = %e, "Generation failed");
            e
        })?;
    if stream && !echo.is_broken() {
        println!();
    }

    tracing::info!(command = "generate", title = %report.title, "Generation complete");
    println!("Generated \"{}\" for {}", report.title, report.repository);
    if report.title_fallback {
        println!("  (title generation failed, placeholder used)");
    }
    for document in &report.documents {
        if let Some(path) = &document.saved_to {
            println!(
                "  {}: {}",
                document.platform.as_str().to_uppercase(),
                path.display()
            );
        }
    }
    Ok(())
}

async fn publish_file(
    settings: &Settings,
    credentials: &Credentials,
    file: &Path,
    platform: &str,
    publish: bool,
) -> Result<()> {
    match platform.parse::<Platform>() {
        Ok(Platform::Devto) => {}
        _ => bail!("Unsupported platform: {platform} (supported: devto)"),
    }
    if !file.exists() {
        bail!("File not found: {}", file.display());
    }
    let api_key = credentials
        .devto_api_key
        .as_deref()
        .with_context(|| format!("{ENV_DEVTO_API_KEY} not set"))?;

    let publish_now = publish || credentials.devto_auto_publish;
    let publisher = Publisher::new(DevToClient::new(&settings.devto.base_url, api_key)?);
    let article = publisher
        .publish_file(file, publish_now)
        .await
        .with_context(|| format!("Failed to publish {}", file.display()))?;

    tracing::info!(command = "publish", id = article.id, url = %article.url, "Publish complete");
    publisher
        .respect_rate_limit(Duration::from_secs(settings.devto.publish_delay_secs))
        .await;
    println!("Title: {}", article.title);
    println!("URL: {}", article.url);
    println!(
        "Status: {}",
        if article.published { "Published" } else { "Draft" }
    );
    Ok(())
}

fn list_files(settings: &Settings, platform: Option<&str>, repo: Option<&str>) -> Result<()> {
    let platform = platform
        .map(|p| p.parse::<Platform>().map_err(anyhow::Error::msg))
        .transpose()?;
    let store = OutputStore::new(settings.output.directory.clone())?;
    let files = store.list(platform, repo)?;

    tracing::info!(command = "list-files", count = files.len(), "Listed generated files");
    if files.is_empty() {
        println!("No generated files found in {}", store.dir().display());
        return Ok(());
    }
    for path in files {
        println!("{}", path.display());
    }
    Ok(())
}

fn config_check(config_path: &Path, settings: &Settings, credentials: &Credentials) -> Result<()> {
    let mark = |present: bool| if present { "ok" } else { "missing" };

    println!("Config file ({}): {}", config_path.display(), mark(config_path.exists()));
    println!(
        "{ENV_GENERATION_API_KEY}: {}",
        mark(credentials.generation_api_key.is_some())
    );
    println!("{ENV_DEVTO_API_KEY}: {}", mark(credentials.devto_api_key.is_some()));
    println!("GITHUB_TOKEN: {}", mark(credentials.github_token.is_some()));
    println!("Model: {}", settings.generation.model);
    println!("Output directory: {}", settings.output.directory.display());

    if credentials.generation_api_key.is_none() {
        tracing::error!(command = "config-check", "Configuration validation failed");
        bail!("{ENV_GENERATION_API_KEY} not set");
    }
    tracing::info!(command = "config-check", "Configuration validation passed");
    Ok(())
}
