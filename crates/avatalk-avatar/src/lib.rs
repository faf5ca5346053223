//! Avatar provider integration.
//!
//! Wraps the D-ID `talks/streams` API used to drive a live WebRTC avatar.
//! The server holds the provider credential and forwards four calls on
//! behalf of the browser: create a stream, complete SDP signaling, send a
//! talk script, and close the stream. The WebRTC media path itself runs
//! between the browser and the provider; nothing here touches media.

pub mod config;
pub mod error;
pub mod script;
pub mod service;

pub use config::{AvatarConfig, VoiceProvider, DEFAULT_AVATAR_API_URL, DEFAULT_PRESENTER_URL};
pub use error::AvatarError;
pub use script::{build_script, TalkScript};
pub use service::AvatarService;
