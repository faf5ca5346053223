//! LLM side of the chat relay.
//!
//! Streams completions from the Gemini `streamGenerateContent` endpoint and
//! assembles each request from the client's history, a fixed persona
//! instruction, and a reference document loaded once at startup.

pub mod client;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod prompt;
pub mod relay;

pub use client::{GeminiClient, TextStream};
pub use config::{GeminiConfig, DEFAULT_GEMINI_API_URL, DEFAULT_GEMINI_MODEL};
pub use error::LlmError;
pub use knowledge::KnowledgeBase;
pub use prompt::{build_contents, SYSTEM_INSTRUCTION};
pub use relay::ChatRelay;
