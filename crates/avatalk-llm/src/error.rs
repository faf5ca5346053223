use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("LLM provider timed out after {0} seconds")]
    Timeout(u64),

    #[error("LLM request failed: {0}")]
    Transport(String),

    #[error("LLM stream error: {0}")]
    Stream(String),

    #[error("invalid LLM response: {0}")]
    InvalidResponse(String),

    #[error("knowledge document error: {0}")]
    Knowledge(String),
}
