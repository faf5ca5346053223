//! Signaling and chat backend.

use crate::decode::Utf8Decoder;
use crate::error::SessionError;
use async_trait::async_trait;
use avatalk_types::{
    ChatRequest, CloseStreamRequest, ScriptType, SessionDescription, StartStreamRequest,
    StreamDescriptor, TalkStreamRequest, Turn,
};
use futures_util::stream::{self, Stream};
use futures_util::StreamExt;
use serde::Serialize;
use serde_json::Value;
use std::pin::Pin;
use std::time::Duration;

/// Text fragments of a chat reply, in arrival order.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<String, SessionError>> + Send>>;

/// Provider identifiers of the open avatar stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarSession {
    pub stream_id: String,
    pub session_id: String,
}

impl From<&StreamDescriptor> for AvatarSession {
    fn from(descriptor: &StreamDescriptor) -> Self {
        Self {
            stream_id: descriptor.id.clone(),
            session_id: descriptor.session_id.clone(),
        }
    }
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn create_stream(&self) -> Result<StreamDescriptor, SessionError>;

    async fn start_stream(
        &self,
        session: &AvatarSession,
        answer: &SessionDescription,
    ) -> Result<(), SessionError>;

    async fn talk_stream(
        &self,
        session: &AvatarSession,
        text: &str,
        script_type: ScriptType,
    ) -> Result<(), SessionError>;

    async fn close_stream(&self, session: &AvatarSession) -> Result<(), SessionError>;

    /// Opens a chat turn. Errors before the first fragment are returned here.
    async fn chat(&self, history: &[Turn], message: &Turn) -> Result<ChatStream, SessionError>;
}

/// [`Backend`] speaking to the relay server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    http: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SessionError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> Result<reqwest::Response, SessionError> {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        check_status(response).await
    }
}

/// Turns a non-2xx response into [`SessionError::Server`].
///
/// JSON bodies contribute their `error` field; anything else is used as text.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SessionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|data| data.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);
    let message = if message.trim().is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        message
    };
    Err(SessionError::Server(message))
}

#[async_trait]
impl Backend for HttpBackend {
    async fn create_stream(&self) -> Result<StreamDescriptor, SessionError> {
        let response = self
            .post("/api/d-id/create-stream", &serde_json::json!({}))
            .await?;
        response
            .json()
            .await
            .map_err(|e| SessionError::Server(format!("invalid stream descriptor: {}", e)))
    }

    async fn start_stream(
        &self,
        session: &AvatarSession,
        answer: &SessionDescription,
    ) -> Result<(), SessionError> {
        let body = StartStreamRequest {
            stream_id: session.stream_id.clone(),
            session_id: session.session_id.clone(),
            answer: answer.clone(),
        };
        self.post("/api/d-id/start-stream", &body).await?;
        Ok(())
    }

    async fn talk_stream(
        &self,
        session: &AvatarSession,
        text: &str,
        script_type: ScriptType,
    ) -> Result<(), SessionError> {
        let body = TalkStreamRequest {
            stream_id: session.stream_id.clone(),
            session_id: session.session_id.clone(),
            text: text.to_string(),
            script_type,
        };
        self.post("/api/d-id/talk-stream", &body).await?;
        Ok(())
    }

    async fn close_stream(&self, session: &AvatarSession) -> Result<(), SessionError> {
        let body = CloseStreamRequest {
            stream_id: session.stream_id.clone(),
            session_id: session.session_id.clone(),
        };
        self.post("/api/d-id/close-stream", &body).await?;
        Ok(())
    }

    async fn chat(&self, history: &[Turn], message: &Turn) -> Result<ChatStream, SessionError> {
        let body = ChatRequest {
            history: history.to_vec(),
            message: message.clone(),
        };
        let response = self.post("/api/chat", &body).await?;
        Ok(decode_body(response.bytes_stream()))
    }
}

/// Decodes a streamed body into text fragments.
///
/// Characters split across chunks are reassembled; a transport error ends
/// the stream after being yielded.
fn decode_body<S, B, E>(bytes: S) -> ChatStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    stream::unfold(
        (bytes.boxed(), Utf8Decoder::default(), false),
        |(mut bytes, mut decoder, finished)| async move {
            if finished {
                return None;
            }
            loop {
                match bytes.next().await {
                    Some(Ok(chunk)) => {
                        let text = decoder.push(chunk.as_ref());
                        if !text.is_empty() {
                            return Some((Ok(text), (bytes, decoder, false)));
                        }
                    }
                    Some(Err(e)) => {
                        return Some((
                            Err(SessionError::Transport(e.to_string())),
                            (bytes, decoder, true),
                        ));
                    }
                    None => {
                        let tail = decoder.finish();
                        if tail.is_empty() {
                            return None;
                        }
                        return Some((Ok(tail), (bytes, decoder, true)));
                    }
                }
            }
        },
    )
    .boxed()
}
