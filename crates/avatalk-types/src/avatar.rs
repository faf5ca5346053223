//! Avatar stream types.
//!
//! The avatar provider issues a `(stream_id, session_id)` pair when a stream
//! is created. Every later call on that stream carries both ids. The request
//! bodies below are what the browser sends to the proxy endpoints.

use serde::{Deserialize, Serialize};

/// ICE server URLs; the provider sends either a single string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IceUrls {
    One(String),
    Many(Vec<String>),
}

impl IceUrls {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(url) => vec![url.clone()],
            Self::Many(urls) => urls.clone(),
        }
    }
}

/// A STUN/TURN server issued by the avatar provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServer {
    pub urls: IceUrls,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// An SDP offer or answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    /// `offer` or `answer`.
    #[serde(rename = "type")]
    pub kind: String,
    pub sdp: String,
}

impl SessionDescription {
    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: "answer".to_string(),
            sdp: sdp.into(),
        }
    }
}

/// Session descriptor returned by stream creation.
///
/// Only the fields the client needs are modeled; the proxy itself passes the
/// provider payload through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// The provider's stream id.
    pub id: String,
    pub session_id: String,
    #[serde(default)]
    pub ice_servers: Vec<IceServer>,
    pub offer: SessionDescription,
}

/// How the avatar should render a talk script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptType {
    /// Synthesized speech from text; carries a voice provider.
    #[default]
    Text,
    /// Audio pass-through; no voice synthesis.
    Audio,
}

impl ScriptType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Audio => "audio",
        }
    }
}

/// Body of `POST /api/d-id/start-stream`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartStreamRequest {
    pub stream_id: String,
    pub session_id: String,
    pub answer: SessionDescription,
}

/// Body of `POST /api/d-id/talk-stream`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalkStreamRequest {
    pub stream_id: String,
    pub session_id: String,
    pub text: String,
    #[serde(rename = "type", default)]
    pub script_type: ScriptType,
}

/// Body of `POST /api/d-id/close-stream`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseStreamRequest {
    pub stream_id: String,
    pub session_id: String,
}
