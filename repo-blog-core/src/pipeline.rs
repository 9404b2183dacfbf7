//! End-to-end generation run: resolve → scan → extract → generate →
//! format → save.
//!
//! Strictly sequential and fail-fast. The only failures that do not abort a
//! run are the title and description fallbacks, which are recorded in the
//! returned [`GenerationReport`].
//!
//! # Navigation
//! - Main entrypoint: [`generate_posts`]
//! - Streaming helper: [`collect_fragments`]

use futures::StreamExt;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::contract::{ContentSource, FragmentStream, TextGenerator};
use crate::error::{GenerationError, PipelineError};
use crate::extract::ContentExtractor;
use crate::format::{
    extract_tags, format_for_devto, format_for_medium, strip_title, DevtoOptions,
    FormattedDocument, Platform,
};
use crate::generate::{ContentGenerator, Generated};
use crate::locator;
use crate::scan::Scanner;
use crate::storage::OutputStore;

/// What to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Any accepted locator form.
    pub repository: String,
    pub platforms: Vec<Platform>,
}

/// Receives body fragments as they arrive when streaming.
pub type FragmentSink<'a> = &'a mut (dyn FnMut(&str) + Send);

#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub repository: String,
    pub title: String,
    pub title_fallback: bool,
    pub description: String,
    pub description_fallback: bool,
    pub tags: Vec<String>,
    /// One per platform, in request order, each with its `saved_to` set.
    pub documents: Vec<FormattedDocument>,
}

/// Drain `stream`, handing each fragment to `sink` and returning the
/// concatenation. Stops at the first error.
pub async fn collect_fragments(
    mut stream: FragmentStream,
    sink: FragmentSink<'_>,
) -> Result<String, GenerationError> {
    let mut body = String::new();
    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        sink(&fragment);
        body.push_str(&fragment);
    }
    info!(chars = body.chars().count(), "[GENERATE] Streaming generation completed");
    Ok(body)
}

/// Run the whole pipeline for one repository.
///
/// With `sink` set the body is streamed through it; otherwise it is
/// generated in one call.
pub async fn generate_posts<S, G>(
    settings: &Settings,
    scanner: &Scanner<S>,
    generator: &ContentGenerator<G>,
    store: &OutputStore,
    request: &GenerateRequest,
    sink: Option<FragmentSink<'_>>,
) -> Result<GenerationReport, PipelineError>
where
    S: ContentSource,
    G: TextGenerator,
{
    info!(repo = %request.repository, "[PIPELINE] Starting generation run");

    if request.platforms.is_empty() {
        return Err(PipelineError::Invalid("no valid platforms requested".into()));
    }

    let locator = locator::resolve(&request.repository)?;

    let scan = scanner
        .scan(&locator, &settings.github.scan_options())
        .await?;
    if scan.files.is_empty() {
        error!(repo = %locator, "[PIPELINE] No documentation files found");
        return Err(PipelineError::Invalid(format!(
            "no documentation files found in {locator}"
        )));
    }
    let metadata = scan.metadata;

    let extractor = ContentExtractor::new(settings.github.priority_files.clone());
    let project_info = extractor.extract_project_info(&scan.files, &metadata);

    let title = generator.generate_title(&project_info).await;

    let options = settings.content.body_options();
    let raw_body = match sink {
        Some(sink) => {
            let stream = generator.stream_body(&project_info, &options).await?;
            collect_fragments(stream, sink).await?
        }
        None => generator.generate_body(&project_info, &options).await?,
    };

    let (body, heading) = strip_title(&raw_body);
    let title = match (title, heading) {
        (Generated::Fallback(_), Some(heading)) if !heading.is_empty() => {
            info!(title = %heading, "[PIPELINE] Using body heading as title");
            Generated::Generated(heading)
        }
        (title, _) => title,
    };
    if title.is_fallback() {
        warn!(title = %title.value(), "[PIPELINE] Using fallback title");
    }

    let description = generator
        .generate_description(&body, settings.content.description_max_length)
        .await;
    let tags = extract_tags(&body, &metadata, settings.content.max_tags);
    let footer = settings.attribution.footer(&metadata.url, generator.model());

    let mut documents = Vec::with_capacity(request.platforms.len());
    for &platform in &request.platforms {
        let mut document = match platform {
            Platform::Devto => format_for_devto(
                &body,
                title.value(),
                DevtoOptions {
                    description: Some(description.value().clone()),
                    tags: tags.clone(),
                    canonical_url: Some(metadata.url.clone()),
                    published: false,
                    ..Default::default()
                },
            )
            .map_err(|e| PipelineError::Invalid(format!("could not render frontmatter: {e}")))?,
            Platform::Medium => {
                format_for_medium(&body, title.value(), Some(description.value()), &tags)
            }
        };
        document.append_footer(&footer);

        let path = store.save(&document.body, &metadata.name, platform)?;
        document.saved_to = Some(path);
        documents.push(document);
    }

    info!(
        repo = %locator,
        files = documents.len(),
        title_fallback = title.is_fallback(),
        description_fallback = description.is_fallback(),
        "[PIPELINE] Generation run complete"
    );

    Ok(GenerationReport {
        repository: locator.to_string(),
        title_fallback: title.is_fallback(),
        title: title.into_inner(),
        description_fallback: description.is_fallback(),
        description: description.into_inner(),
        tags,
        documents,
    })
}
