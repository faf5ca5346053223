//! Client-side session controller for the avatar assistant.
//!
//! Drives one avatar connection through its lifecycle (stream creation, SDP
//! offer/answer, connection monitoring, talk, teardown), runs chat turns
//! against the relay with an optimistic in-memory history, optionally
//! attaches a screen frame to outgoing messages, and runs the hands-free
//! voice conversation loop.
//!
//! Platform pieces are trait seams: the signaling [`Backend`], the WebRTC
//! [`PeerConnection`], the [`SpeechRecognizer`] and the screen
//! [`FrameSource`]. [`HttpBackend`] implements the backend against the relay
//! server; the rest are supplied by the embedding UI.

pub mod backend;
pub mod controller;
pub mod decode;
pub mod error;
pub mod notice;
pub mod peer;
pub mod screen;
pub mod transcript;
pub mod voice;

pub use backend::{AvatarSession, Backend, ChatStream, HttpBackend};
pub use controller::{ConnectionState, SessionConfig, SessionController, SessionEvent};
pub use error::SessionError;
pub use peer::{PeerConnection, PeerFactory, PeerState};
pub use screen::{encode_jpeg, Frame, FrameSource, ScreenShare};
pub use transcript::{Speaker, Transcript, TranscriptEntry};
pub use voice::{
    RecognitionError, RecognitionEvent, SpeechRecognizer, TranscriptSegment, VoiceAction,
    VoiceDriver, VoiceHandle, VoiceLoop, VoiceOutput, SILENCE_TIMEOUT,
};
