//! Ollama-compatible chat API client implementing [`TextGenerator`].
//!
//! `POST {host}/api/chat` with a bearer token. Non-streaming replies are a
//! single JSON object; streaming replies are newline-delimited JSON chunks,
//! each carrying the next `message.content` fragment.

use std::fmt::Display;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use repo_blog_core::contract::{ChatMessage, ChatRequest, FragmentStream, TextGenerator};
use repo_blog_core::error::GenerationError;

pub struct OllamaClient {
    http: Client,
    endpoint: String,
}

impl OllamaClient {
    pub fn new(host: &str, api_key: &str) -> Result<Self, GenerationError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| GenerationError::Rejected {
                status: 0,
                body: format!("invalid API key header: {e}"),
            })?;
        headers.insert(AUTHORIZATION, bearer);

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| GenerationError::Transient(e.to_string()))?;
        let endpoint = format!("{}/api/chat", host.trim_end_matches('/'));

        info!(endpoint = %endpoint, "Initialized Ollama client");
        Ok(Self { http, endpoint })
    }

    async fn send(&self, request: &ChatRequest, stream: bool) -> Result<Response, GenerationError> {
        let body = ChatBody {
            model: &request.model,
            messages: &request.messages,
            stream,
        };
        debug!(model = %request.model, stream, "Sending chat request");
        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        error!(status = %status, body = %body, "Chat API returned error");
        if status.as_u16() == 429 || status.is_server_error() {
            Err(GenerationError::Transient(format!("{status}: {body}")))
        } else {
            Err(GenerationError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[derive(Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatChunk {
    message: Option<ChunkMessage>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

/// Decode one NDJSON line. Blank lines and empty fragments yield `None`.
fn parse_line(line: &[u8]) -> Result<Option<String>, GenerationError> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let chunk: ChatChunk =
        serde_json::from_str(line).map_err(|e| GenerationError::Decode(e.to_string()))?;
    if let Some(message) = chunk.error {
        return Err(GenerationError::Transient(message));
    }
    Ok(chunk
        .message
        .map(|m| m.content)
        .filter(|content| !content.is_empty()))
}

struct LineState<S> {
    bytes: std::pin::Pin<Box<S>>,
    buffer: Vec<u8>,
    finished: bool,
}

/// Turn a byte stream of NDJSON chunks into content fragments.
///
/// Chunk boundaries need not align with lines; at most one partial line is
/// buffered.
pub fn ndjson_fragments<S, B, E>(bytes: S) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = LineState {
        bytes: Box::pin(bytes),
        buffer: Vec::new(),
        finished: false,
    };
    futures::stream::try_unfold(state, |mut state| async move {
        loop {
            if let Some(end) = state.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = state.buffer.drain(..=end).collect();
                if let Some(fragment) = parse_line(&line)? {
                    return Ok(Some((fragment, state)));
                }
                continue;
            }
            if state.finished {
                let rest = std::mem::take(&mut state.buffer);
                return Ok(parse_line(&rest)?.map(|fragment| (fragment, state)));
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => state.buffer.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => return Err(GenerationError::Transient(e.to_string())),
                None => state.finished = true,
            }
        }
    })
    .boxed()
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn chat(&self, request: ChatRequest) -> Result<String, GenerationError> {
        let response = self.send(&request, false).await?;
        let chunk: ChatChunk = response
            .json()
            .await
            .map_err(|e| GenerationError::Decode(e.to_string()))?;
        if let Some(message) = chunk.error {
            return Err(GenerationError::Transient(message));
        }
        let content = chunk
            .message
            .map(|m| m.content)
            .ok_or_else(|| GenerationError::Decode("reply has no message".into()))?;
        debug!(chars = content.chars().count(), "Chat reply received");
        Ok(content)
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<FragmentStream, GenerationError> {
        let response = self.send(&request, true).await?;
        info!("Streaming chat reply");
        Ok(ndjson_fragments(response.bytes_stream()))
    }
}
