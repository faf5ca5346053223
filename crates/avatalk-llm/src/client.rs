//! Streaming client for the Gemini API.

use crate::config::GeminiConfig;
use crate::error::LlmError;
use avatalk_types::Turn;
use eventsource_stream::{Event, Eventsource};
use futures_util::stream::{self, BoxStream, Stream};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;

/// Stream of completion text fragments in arrival order.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: &'a [Turn],
}

#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ProviderError,
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.request_timeout())
            .build()
            .map_err(|e| LlmError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Starts a streaming completion.
    ///
    /// Returns once the provider has accepted the request; errors reported by
    /// the provider before that point come back as `Err` here, later ones as
    /// items of the stream.
    pub async fn stream_generate(&self, contents: &[Turn]) -> Result<TextStream, LlmError> {
        let timeout = self.config.request_timeout();
        let request = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&GenerateRequest { contents });

        let response = tokio::time::timeout(timeout, request.send())
            .await
            .map_err(|_| LlmError::Timeout(timeout.as_secs()))?
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.error.message)
                .unwrap_or_else(|| format!("HTTP {}", status));
            tracing::error!(
                model = %self.config.model,
                status = status.as_u16(),
                "LLM provider rejected request: {}",
                message
            );
            return Err(LlmError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let events = response
            .bytes_stream()
            .eventsource()
            .map(|event| event.map_err(|e| e.to_string()))
            .boxed();
        Ok(text_fragments(events, timeout))
    }
}

/// Turns SSE events into text fragments, ending the stream after the first error.
fn text_fragments(
    events: BoxStream<'static, Result<Event, String>>,
    idle_timeout: Duration,
) -> TextStream {
    let fragments = stream::unfold(Some(events), move |state| async move {
        let mut events = match state {
            Some(events) => events,
            None => return None,
        };
        loop {
            let event = match tokio::time::timeout(idle_timeout, events.next()).await {
                Err(_) => return Some((Err(LlmError::Timeout(idle_timeout.as_secs())), None)),
                Ok(None) => return None,
                Ok(Some(Err(e))) => return Some((Err(LlmError::Stream(e)), None)),
                Ok(Some(Ok(event))) => event,
            };

            match parse_event(&event.data) {
                Ok(Some(text)) => return Some((Ok(text), Some(events))),
                Ok(None) => continue,
                Err(e) => return Some((Err(e), None)),
            }
        }
    });
    Box::pin(fragments)
}

/// Extracts the text of one SSE `data` payload. `None` means nothing to forward.
fn parse_event(data: &str) -> Result<Option<String>, LlmError> {
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }

    let chunk: GenerateChunk = serde_json::from_str(data)
        .map_err(|e| LlmError::InvalidResponse(format!("{}: {}", e, data)))?;

    if let Some(error) = chunk.error {
        return Err(LlmError::Provider {
            status: error.code.unwrap_or(500),
            message: error
                .message
                .unwrap_or_else(|| "error reported mid-stream".to_string()),
        });
    }

    let text: String = chunk
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        Ok(None)
    } else {
        Ok(Some(text))
    }
}
