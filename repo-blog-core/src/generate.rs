//! Prompt building and generation orchestration: title, body and
//! description, each one service call wrapped in the shared retry loop.
//!
//! Title and description have deterministic fallbacks and never fail; the
//! body has none and surfaces a [`GenerationError`].

use tracing::{error, info, warn};

use crate::contract::{ChatMessage, ChatRequest, FragmentStream, Sleeper, TextGenerator};
use crate::error::GenerationError;
use crate::retry::{with_retry, RetryFailure, RetryPolicy, TokioSleeper};

/// Used when title generation fails.
pub const FALLBACK_TITLE: &str = "Exploring an Interesting GitHub Project";

/// Characters of project info given to the title prompt.
pub const TITLE_CONTEXT_CHARS: usize = 1000;

/// Characters of the body given to the description prompt.
pub const DESCRIPTION_EXCERPT_CHARS: usize = 500;

pub const DEFAULT_DESCRIPTION_LENGTH: usize = 160;

const SYSTEM_PROMPT: &str = "You are a skilled technical writer who creates engaging, modern and \
visually appealing blog posts about software projects. You use emojis to aid readability. You \
focus on a project's strengths, features and technical implementation, including any AI or \
prompt-engineering aspects, rather than on setup instructions.";

/// A value that was either produced by the service or substituted after the
/// service failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generated<T> {
    Generated(T),
    Fallback(T),
}

impl<T> Generated<T> {
    pub fn value(&self) -> &T {
        match self {
            Generated::Generated(v) | Generated::Fallback(v) => v,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Generated::Generated(v) | Generated::Fallback(v) => v,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Generated::Fallback(_))
    }
}

/// Style directives for the body prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyOptions {
    pub tone: String,
    /// Approximate word count.
    pub target_length: u32,
    pub additional_instructions: Option<String>,
}

impl Default for BodyOptions {
    fn default() -> Self {
        Self {
            tone: "professional but witty".to_string(),
            target_length: 1500,
            additional_instructions: None,
        }
    }
}

/// Build the instruction block for body generation.
pub fn build_prompt(project_info: &str, options: &BodyOptions) -> String {
    let mut parts = vec![
        "You are writing an engaging, modern blog post about a GitHub project.".to_string(),
        String::new(),
        "Project Information:".to_string(),
        project_info.to_string(),
        String::new(),
        "Instructions:".to_string(),
        format!("- Write in a {} tone", options.tone),
        format!(
            "- Target length: approximately {} words",
            options.target_length
        ),
        "- Use emojis throughout, two or three per section".to_string(),
        "- Prefix section headings with an emoji (e.g. '🚀 Key Features', '✨ Core Strengths')"
            .to_string(),
        String::new(),
        "Content focus:".to_string(),
        "- Lead with the project's core strengths and key features".to_string(),
        "- Explain the problem it solves and what sets it apart".to_string(),
        "- If it uses AI or LLMs, cover how and the prompt-engineering approach".to_string(),
        "- Describe the architecture and notable design decisions".to_string(),
        "- Include code examples that show capabilities, not installation".to_string(),
        "- Discuss use cases and real-world applications".to_string(),
        String::new(),
        "Avoid:".to_string(),
        "- Setup, installation or 'Getting Started' walkthroughs".to_string(),
        "- Environment and configuration details".to_string(),
        "- More than two sentences pointing readers at the README for setup".to_string(),
        String::new(),
        "Structure:".to_string(),
        "- Open with a compelling introduction of what the project does".to_string(),
        "- Spend most of the post on features, architecture and implementation".to_string(),
        "- Use clear sections with emoji headings".to_string(),
        String::new(),
    ];

    if let Some(extra) = options
        .additional_instructions
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        parts.push("Additional Instructions:".to_string());
        parts.push(extra.to_string());
        parts.push(String::new());
    }

    parts.push(
        "Generate a comprehensive, engaging blog post in Markdown that showcases the project's \
         technical strengths."
            .to_string(),
    );
    parts.join("\n")
}

fn title_prompt(project_info: &str) -> String {
    format!(
        "Based on this GitHub project information, write a catchy blog post title.\n\n\
         Project Information:\n{}\n\n\
         Requirements:\n\
         - Under 80 characters\n\
         - Engaging and clear about what the project is\n\
         - Use action words where they fit\n\n\
         Reply with the title only.",
        prefix_chars(project_info, TITLE_CONTEXT_CHARS)
    )
}

fn description_prompt(excerpt: &str, max_len: usize) -> String {
    format!(
        "Based on this blog post excerpt, write a compelling meta description.\n\n\
         Excerpt:\n{excerpt}\n\n\
         Requirements:\n\
         - At most {max_len} characters\n\
         - Summarize the main point\n\
         - Make it engaging\n\n\
         Reply with the description only."
    )
}

/// First `n` characters of `text`.
pub fn prefix_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

/// Clip `text` to `max_len` characters, ending in `...` when clipped.
pub fn clip_with_ellipsis(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    if max_len < 3 {
        return prefix_chars(text, max_len).to_string();
    }
    format!("{}...", prefix_chars(text, max_len - 3))
}

fn clean_reply(reply: &str) -> &str {
    reply.trim().trim_matches(['"', '\''])
}

/// Drives a [`TextGenerator`] for the three generation steps.
pub struct ContentGenerator<G> {
    generator: G,
    model: String,
    policy: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
}

impl<G: TextGenerator> ContentGenerator<G> {
    pub fn new(generator: G, model: impl Into<String>) -> Self {
        let model = model.into();
        info!(model = %model, "[GENERATE] Initialized content generator");
        Self {
            generator,
            model,
            policy: RetryPolicy::default(),
            sleeper: Box::new(TokioSleeper),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages,
        }
    }

    async fn chat(
        &self,
        stage: &'static str,
        request: ChatRequest,
    ) -> Result<String, RetryFailure<GenerationError>> {
        with_retry(
            &self.policy,
            self.sleeper.as_ref(),
            stage,
            GenerationError::is_retryable,
            |_| self.generator.chat(request.clone()),
        )
        .await
    }

    fn body_request(&self, project_info: &str, options: &BodyOptions) -> ChatRequest {
        let prompt = build_prompt(project_info, options);
        info!(
            prompt_chars = prompt.chars().count(),
            "[GENERATE] Generating blog post"
        );
        self.request(vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)])
    }

    /// Generate a title from the first [`TITLE_CONTEXT_CHARS`] of
    /// `project_info`, falling back to [`FALLBACK_TITLE`].
    pub async fn generate_title(&self, project_info: &str) -> Generated<String> {
        let request = self.request(vec![ChatMessage::user(title_prompt(project_info))]);
        match self.chat("title", request).await {
            Ok(reply) => {
                let title = clean_reply(&reply);
                if title.is_empty() {
                    warn!("[GENERATE] Empty title returned, using fallback");
                    return Generated::Fallback(FALLBACK_TITLE.to_string());
                }
                info!(title = %title, "[GENERATE] Generated title");
                Generated::Generated(title.to_string())
            }
            Err(failure) => {
                error!(
                    attempts = failure.attempts,
                    error = %failure.error,
                    "[GENERATE] Failed to generate title, using fallback"
                );
                Generated::Fallback(FALLBACK_TITLE.to_string())
            }
        }
    }

    /// Generate the post body. There is no fallback.
    pub async fn generate_body(
        &self,
        project_info: &str,
        options: &BodyOptions,
    ) -> Result<String, GenerationError> {
        let request = self.body_request(project_info, options);
        match self.chat("body", request).await {
            Ok(body) => {
                info!(chars = body.chars().count(), "[GENERATE] Generated content");
                Ok(body)
            }
            Err(failure) => {
                error!(
                    attempts = failure.attempts,
                    error = %failure.error,
                    "[GENERATE] Failed to generate content"
                );
                Err(into_generation_error(failure))
            }
        }
    }

    /// Open a streamed body generation. Only opening the stream is retried;
    /// a failure mid-stream surfaces as an `Err` item.
    pub async fn stream_body(
        &self,
        project_info: &str,
        options: &BodyOptions,
    ) -> Result<FragmentStream, GenerationError> {
        let request = self.body_request(project_info, options);
        with_retry(
            &self.policy,
            self.sleeper.as_ref(),
            "body-stream",
            GenerationError::is_retryable,
            |_| self.generator.chat_stream(request.clone()),
        )
        .await
        .map_err(into_generation_error)
    }

    /// Generate a meta description of at most `max_len` characters from the
    /// first [`DESCRIPTION_EXCERPT_CHARS`] of `body`. Falls back to the
    /// clipped excerpt.
    pub async fn generate_description(&self, body: &str, max_len: usize) -> Generated<String> {
        let excerpt = prefix_chars(body, DESCRIPTION_EXCERPT_CHARS);
        let request = self.request(vec![ChatMessage::user(description_prompt(excerpt, max_len))]);
        match self.chat("description", request).await {
            Ok(reply) => {
                let description = clip_with_ellipsis(clean_reply(&reply), max_len);
                info!(description = %description, "[GENERATE] Generated description");
                Generated::Generated(description)
            }
            Err(failure) => {
                error!(
                    attempts = failure.attempts,
                    error = %failure.error,
                    "[GENERATE] Failed to generate description, using excerpt"
                );
                Generated::Fallback(clip_with_ellipsis(excerpt, max_len))
            }
        }
    }
}

fn into_generation_error(failure: RetryFailure<GenerationError>) -> GenerationError {
    if failure.exhausted {
        GenerationError::Exhausted {
            attempts: failure.attempts,
            last: failure.error.to_string(),
        }
    } else {
        failure.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_leaves_short_text_alone() {
        assert_eq!(clip_with_ellipsis("short", 10), "short");
        assert_eq!(clip_with_ellipsis("exactly10!", 10), "exactly10!");
    }

    #[test]
    fn clip_appends_ellipsis_within_limit() {
        let clipped = clip_with_ellipsis("abcdefghijkl", 10);
        assert_eq!(clipped, "abcdefg...");
        assert_eq!(clipped.chars().count(), 10);
    }

    #[test]
    fn clip_below_ellipsis_width_never_exceeds_limit() {
        for max_len in 0..3 {
            let clipped = clip_with_ellipsis("abcdef", max_len);
            assert_eq!(clipped, &"abcdef"[..max_len]);
        }
    }

    #[test]
    fn prompt_includes_extra_instructions_only_when_given() {
        let mut options = BodyOptions::default();
        let plain = build_prompt("INFO", &options);
        assert!(plain.contains("INFO"));
        assert!(plain.contains("professional but witty"));
        assert!(plain.contains("approximately 1500 words"));
        assert!(!plain.contains("Additional Instructions:"));

        options.additional_instructions = Some("Mention the benchmarks".into());
        let extended = build_prompt("INFO", &options);
        assert!(extended.contains("Additional Instructions:\nMention the benchmarks"));
    }

    #[test]
    fn title_prompt_is_bounded() {
        let info = "x".repeat(5000);
        let prompt = title_prompt(&info);
        assert!(prompt.contains(&"x".repeat(TITLE_CONTEXT_CHARS)));
        assert!(!prompt.contains(&"x".repeat(TITLE_CONTEXT_CHARS + 1)));
    }
}
