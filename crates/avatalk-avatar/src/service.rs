use crate::config::AvatarConfig;
use crate::error::AvatarError;
use crate::script::build_script;
use avatalk_types::{ScriptType, SessionDescription};
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde_json::{json, Value};
use url::Url;

/// Fallback when the provider rejects a call without a description.
const UNKNOWN_PROVIDER_ERROR: &str = "unknown avatar provider error";

/// Client for the avatar provider's streaming API.
///
/// Stateless apart from the HTTP connection pool; stream ownership stays with
/// the browser, which passes the ids back on every call.
#[derive(Debug, Clone)]
pub struct AvatarService {
    config: AvatarConfig,
    base_url: Url,
    http: reqwest::Client,
}

impl AvatarService {
    pub fn new(config: AvatarConfig) -> Result<Self, AvatarError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| AvatarError::Config(format!("invalid base_url {:?}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AvatarError::Config(format!(
                "base_url cannot carry a path: {}",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AvatarError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            base_url,
            http,
        })
    }

    /// False when no API key is configured; every provider call would fail.
    pub fn is_enabled(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    /// Creates a new avatar stream with the configured presenter.
    ///
    /// Returns the provider's session descriptor untouched.
    pub async fn create_stream(&self) -> Result<Value, AvatarError> {
        let body = json!({
            "source_url": self.config.presenter_url,
            "config": { "stitch": true },
        });
        self.send(Method::POST, self.streams_url(&[])?, body).await
    }

    /// Completes signaling by handing the browser's SDP answer to the provider.
    pub async fn start_stream(
        &self,
        stream_id: &str,
        session_id: &str,
        answer: &SessionDescription,
    ) -> Result<Value, AvatarError> {
        let body = json!({
            "answer": answer,
            "session_id": session_id,
        });
        self.send(Method::POST, self.streams_url(&[stream_id, "sdp"])?, body)
            .await
    }

    /// Makes the avatar speak `text` on an open stream.
    pub async fn talk_stream(
        &self,
        stream_id: &str,
        session_id: &str,
        text: &str,
        script_type: ScriptType,
    ) -> Result<Value, AvatarError> {
        let script = build_script(text, script_type, &self.config.voice);
        let body = json!({
            "script": script,
            "config": {
                "fluent": "true",
                "pad_audio": "0.0",
            },
            "session_id": session_id,
        });
        self.send(Method::POST, self.streams_url(&[stream_id])?, body)
            .await
    }

    /// Tears down a stream.
    ///
    /// The provider's verdict is only logged; a stream that is already gone
    /// is not an error for the caller. Transport failures are returned.
    pub async fn close_stream(&self, stream_id: &str, session_id: &str) -> Result<(), AvatarError> {
        let response = self
            .http
            .request(Method::DELETE, self.streams_url(&[stream_id])?)
            .header(AUTHORIZATION, self.authorization())
            .json(&json!({ "session_id": session_id }))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                stream_id,
                status = status.as_u16(),
                "avatar provider refused to close stream"
            );
        }
        Ok(())
    }

    fn authorization(&self) -> String {
        format!("Basic {}", self.config.api_key)
    }

    /// Builds `{base}/talks/streams/{segments..}` with each segment percent-encoded.
    ///
    /// Empty, `.` and `..` segments are refused: the URL serializer would
    /// drop or resolve them instead of encoding them.
    fn streams_url(&self, segments: &[&str]) -> Result<Url, AvatarError> {
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(AvatarError::InvalidRequest(format!("invalid stream id {:?}", bad)));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AvatarError::Config("base_url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(["talks", "streams"])
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, body: Value) -> Result<Value, AvatarError> {
        let path = url.path().to_string();
        let response = self
            .http
            .request(method, url)
            .header(AUTHORIZATION, self.authorization())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Value>(&bytes)
                .ok()
                .and_then(|data| provider_message(&data))
                .unwrap_or_else(|| UNKNOWN_PROVIDER_ERROR.to_string());
            tracing::error!(
                path = %path,
                status = status.as_u16(),
                "avatar provider error: {}",
                message
            );
            return Err(AvatarError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| AvatarError::InvalidResponse(e.to_string()))
    }

    fn transport_error(&self, e: reqwest::Error) -> AvatarError {
        if e.is_timeout() {
            AvatarError::Timeout(self.config.request_timeout_secs)
        } else {
            AvatarError::Transport(e.to_string())
        }
    }
}

/// Extracts the human-readable reason from a provider error body.
fn provider_message(data: &Value) -> Option<String> {
    ["description", "message"]
        .iter()
        .find_map(|key| data.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
