use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

fn default_base_url() -> String {
    DEFAULT_GEMINI_API_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_knowledge_path() -> PathBuf {
    PathBuf::from("knowledge/guia_app.pdf")
}

fn default_knowledge_mime() -> String {
    "application/pdf".to_string()
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Bounds the initial request and every idle gap in the stream.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Replaces the built-in persona instruction when set.
    #[serde(default)]
    pub system_instruction: Option<String>,
    /// Reference document attached to every turn.
    #[serde(default = "default_knowledge_path")]
    pub knowledge_path: PathBuf,
    #[serde(default = "default_knowledge_mime")]
    pub knowledge_mime: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            request_timeout_secs: default_request_timeout_secs(),
            system_instruction: None,
            knowledge_path: default_knowledge_path(),
            knowledge_mime: default_knowledge_mime(),
        }
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("system_instruction", &self.system_instruction.is_some())
            .field("knowledge_path", &self.knowledge_path)
            .field("knowledge_mime", &self.knowledge_mime)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
