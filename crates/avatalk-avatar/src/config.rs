use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Base URL of the D-ID REST API.
pub const DEFAULT_AVATAR_API_URL: &str = "https://api.d-id.com";

/// Presenter image used for every stream.
pub const DEFAULT_PRESENTER_URL: &str =
    "https://create-images-results.d-id.com/DefaultPresenters/Gordon_m/v2_with_background_image.jpg";

fn default_base_url() -> String {
    DEFAULT_AVATAR_API_URL.to_string()
}

fn default_presenter_url() -> String {
    DEFAULT_PRESENTER_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Voice synthesis settings attached to text scripts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceProvider {
    #[serde(rename = "type", default = "default_voice_kind")]
    pub kind: String,
    #[serde(default = "default_voice_id")]
    pub voice_id: String,
}

fn default_voice_kind() -> String {
    "microsoft".to_string()
}

fn default_voice_id() -> String {
    "es-ES-ArnauNeural".to_string()
}

impl Default for VoiceProvider {
    fn default() -> Self {
        Self {
            kind: default_voice_kind(),
            voice_id: default_voice_id(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AvatarConfig {
    /// Sent verbatim after `Basic ` in the `Authorization` header.
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_presenter_url")]
    pub presenter_url: String,
    #[serde(default)]
    pub voice: VoiceProvider,
    /// Upper bound for each outbound provider call. Default: 30 seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            presenter_url: default_presenter_url(),
            voice: VoiceProvider::default(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl fmt::Debug for AvatarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvatarConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("presenter_url", &self.presenter_url)
            .field("voice", &self.voice)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl AvatarConfig {
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
