//! Shared types and constants for the avatalk workspace.
//!
//! This crate holds the wire types exchanged between the browser-facing
//! client session, the relay server, and the two upstream providers:
//! conversation turns for the LLM relay and stream descriptors for the
//! avatar proxy. It has no runtime dependencies beyond `serde`, so every
//! other crate can depend on it without pulling in an HTTP stack.

pub mod avatar;
pub mod conversation;

pub use avatar::{
    CloseStreamRequest, IceServer, IceUrls, ScriptType, SessionDescription, StartStreamRequest,
    StreamDescriptor, TalkStreamRequest,
};
pub use conversation::{ChatRequest, InlineData, Part, Role, Turn};

/// Literal written by the chat relay when the provider fails.
///
/// Sent as the whole body when nothing was streamed yet, or appended to
/// the partial body when the provider fails mid-stream. Clients compare
/// against it to detect a failed turn.
pub const RELAY_FAILURE_TEXT: &str = "Error: No se pudo procesar la respuesta.";

/// Acknowledgement returned by the close-stream endpoint.
pub const STREAM_CLOSED_MESSAGE: &str = "Stream cerrado";

/// Returns `true` if a streamed chat reply carries the relay failure marker.
pub fn is_relay_failure(reply: &str) -> bool {
    reply.ends_with(RELAY_FAILURE_TEXT)
}
