use thiserror::Error;

#[derive(Error, Debug)]
pub enum AvatarError {
    /// Non-2xx from the provider; the message is the provider's description.
    #[error("{message}")]
    Provider { status: u16, message: String },

    #[error("avatar provider request timed out after {0} seconds")]
    Timeout(u64),

    #[error("avatar provider request failed: {0}")]
    Transport(String),

    #[error("invalid avatar provider response: {0}")]
    InvalidResponse(String),

    /// Caller-supplied input the provider path cannot carry.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
