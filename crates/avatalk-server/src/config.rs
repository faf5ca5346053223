//! Server configuration loading from file and environment variables.

use avatalk_avatar::AvatarConfig;
use avatalk_llm::GeminiConfig;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// LLM provider and reference document.
    #[serde(default)]
    pub llm: GeminiConfig,

    /// Avatar streaming provider.
    #[serde(default)]
    pub avatar: AvatarConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the browser client.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "avatalk_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `AVATALK_HOST` overrides `server.host`
/// - `AVATALK_PORT` overrides `server.port`
/// - `AVATALK_STATIC_DIR` overrides `server.static_dir`
/// - `AVATALK_LOG_LEVEL` overrides `logging.level`
/// - `AVATALK_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `AVATALK_KNOWLEDGE_PATH` overrides `llm.knowledge_path`
/// - `GEMINI_API_KEY` overrides `llm.api_key`
/// - `GEMINI_MODEL` overrides `llm.model`
/// - `DID_API_KEY` overrides `avatar.api_key`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies overrides from `lookup`, which maps a variable name to its value.
fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(host) = lookup("AVATALK_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = lookup("AVATALK_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(dir) = lookup("AVATALK_STATIC_DIR") {
        config.server.static_dir = PathBuf::from(dir);
    }
    if let Some(level) = lookup("AVATALK_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("AVATALK_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(path) = lookup("AVATALK_KNOWLEDGE_PATH") {
        config.llm.knowledge_path = PathBuf::from(path);
    }
    if let Some(key) = lookup("GEMINI_API_KEY") {
        config.llm.api_key = key;
    }
    if let Some(model) = lookup("GEMINI_MODEL") {
        config.llm.model = model;
    }
    if let Some(key) = lookup("DID_API_KEY") {
        config.avatar.api_key = key;
    }
}
