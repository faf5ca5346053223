use crate::peer::PeerState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// The relay server answered with a non-2xx status.
    #[error("server error: {0}")]
    Server(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("connection timed out")]
    ConnectTimeout,

    /// The peer connection reached a terminal state before connecting.
    #[error("connection failed or closed (state: {0})")]
    PeerState(PeerState),

    #[error("peer connection error: {0}")]
    Peer(String),

    #[error("avatar stream is not connected")]
    NotConnected,

    /// The relay streamed its failure marker instead of a reply.
    #[error("the relay could not produce a reply")]
    RelayFailure,

    #[error("screen capture failed: {0}")]
    Capture(String),
}
