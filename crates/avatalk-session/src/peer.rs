//! Peer connection seam.
//!
//! The controller only negotiates; media handling stays with whatever WebRTC
//! stack the embedder provides.

use crate::error::SessionError;
use async_trait::async_trait;
use avatalk_types::{IceServer, SessionDescription};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Native peer connection states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl PeerState {
    /// States that end a connect attempt unsuccessfully.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Disconnected | Self::Failed | Self::Closed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Failed => "failed",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for PeerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn set_remote_description(&self, offer: &SessionDescription) -> Result<(), SessionError>;

    async fn create_answer(&self) -> Result<SessionDescription, SessionError>;

    async fn set_local_description(&self, answer: &SessionDescription) -> Result<(), SessionError>;

    /// Watch channel tracking the connection state.
    fn states(&self) -> watch::Receiver<PeerState>;

    fn state(&self) -> PeerState {
        *self.states().borrow()
    }

    async fn close(&self);
}

/// Builds peer connections from provider-issued ICE servers.
#[async_trait]
pub trait PeerFactory: Send + Sync {
    async fn create(&self, ice_servers: &[IceServer]) -> Result<Arc<dyn PeerConnection>, SessionError>;
}
