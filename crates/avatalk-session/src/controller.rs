//! Session controller: one avatar connection, one chat history.

use crate::backend::{AvatarSession, Backend};
use crate::error::SessionError;
use crate::notice;
use crate::peer::{PeerConnection, PeerFactory, PeerState};
use crate::screen::{FrameSource, ScreenShare};
use crate::transcript::{Speaker, Transcript, TranscriptEntry};
use crate::voice::{VoiceHandle, VoiceOutput};
use avatalk_types::{is_relay_failure, Part, Role, ScriptType, Turn};
use futures_util::StreamExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use uuid::Uuid;

/// Upper bound for one connect attempt, from stream creation to `connected`.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub connect_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Updates for the embedding UI.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Status(String),
    State(ConnectionState),
    EntryAdded(TranscriptEntry),
    EntryUpdated(TranscriptEntry),
    /// Pending voice transcript for the input field; empty clears it.
    Draft(String),
}

/// Drives the avatar connection and the chat conversation.
///
/// Owns the in-memory history sent to the model. User turns are added
/// optimistically and rolled back when the reply fails, so the history only
/// ever holds completed exchanges plus, transiently, the pending user turn.
pub struct SessionController {
    backend: Arc<dyn Backend>,
    peers: Arc<dyn PeerFactory>,
    config: SessionConfig,
    state: ConnectionState,
    peer: Option<Arc<dyn PeerConnection>>,
    stream: Option<AvatarSession>,
    history: Vec<Turn>,
    transcript: Transcript,
    screen: Option<ScreenShare>,
    voice: Option<VoiceHandle>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(backend: Arc<dyn Backend>, peers: Arc<dyn PeerFactory>, config: SessionConfig) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            backend,
            peers,
            config,
            state: ConnectionState::Idle,
            peer: None,
            stream: None,
            history: Vec::new(),
            transcript: Transcript::default(),
            screen: None,
            voice: None,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Lifecycle state. Once connected, follows the peer's own state.
    pub fn state(&self) -> ConnectionState {
        if self.state != ConnectionState::Connected {
            return self.state;
        }
        match self.peer.as_ref().map(|peer| peer.state()) {
            Some(PeerState::Connected) => ConnectionState::Connected,
            Some(PeerState::Failed) => ConnectionState::Failed,
            Some(PeerState::Closed) => ConnectionState::Closed,
            _ => ConnectionState::Disconnected,
        }
    }

    /// True only while the peer connection itself reports `connected`.
    pub fn is_connected(&self) -> bool {
        self.peer
            .as_ref()
            .is_some_and(|peer| peer.state() == PeerState::Connected)
    }

    pub fn stream(&self) -> Option<&AvatarSession> {
        self.stream.as_ref()
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_sharing_screen(&self) -> bool {
        self.screen.is_some()
    }

    /// Opens a fresh avatar stream and waits for the peer to connect.
    ///
    /// The whole attempt is bounded by the configured timeout. On failure
    /// the peer is closed, the stream is closed best-effort, and the
    /// session lands in [`ConnectionState::Failed`].
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        if self.is_connected() {
            return Ok(());
        }
        self.set_status(notice::CONNECTING);
        self.set_state(ConnectionState::Connecting);

        let limit = self.config.connect_timeout;
        let outcome = match tokio::time::timeout(limit, self.negotiate()).await {
            Ok(result) => result,
            Err(_) => Err(SessionError::ConnectTimeout),
        };

        match outcome {
            Ok(()) => {
                tracing::info!(
                    stream_id = self.stream.as_ref().map(|s| s.stream_id.as_str()),
                    "avatar connected"
                );
                self.set_state(ConnectionState::Connected);
                self.set_status(notice::CONNECTED);
                Ok(())
            }
            Err(e) => {
                tracing::error!("avatar connection failed: {}", e);
                self.abandon_connection().await;
                self.set_state(ConnectionState::Failed);
                self.set_status(format!("Error: {}", e));
                Err(e)
            }
        }
    }

    async fn negotiate(&mut self) -> Result<(), SessionError> {
        if let Some(previous) = self.peer.take() {
            previous.close().await;
        }
        if let Some(previous) = self.stream.take() {
            self.spawn_close(previous);
        }

        let descriptor = self.backend.create_stream().await?;
        let stream = AvatarSession::from(&descriptor);
        self.stream = Some(stream.clone());

        let peer = self.peers.create(&descriptor.ice_servers).await?;
        let mut states = peer.states();
        self.peer = Some(peer.clone());

        peer.set_remote_description(&descriptor.offer).await?;
        let answer = peer.create_answer().await?;
        peer.set_local_description(&answer).await?;
        self.backend.start_stream(&stream, &answer).await?;

        wait_until_connected(&mut states).await
    }

    async fn abandon_connection(&mut self) {
        if let Some(peer) = self.peer.take() {
            peer.close().await;
        }
        if let Some(stream) = self.stream.take() {
            self.spawn_close(stream);
        }
    }

    fn spawn_close(&self, stream: AvatarSession) {
        let backend = self.backend.clone();
        tokio::spawn(async move {
            if let Err(e) = backend.close_stream(&stream).await {
                tracing::warn!(stream_id = %stream.stream_id, "failed to close avatar stream: {}", e);
            }
        });
    }

    /// Makes the avatar speak, reconnecting once if the connection dropped.
    pub async fn talk(&mut self, text: &str, script_type: ScriptType) -> Result<(), SessionError> {
        if !self.is_connected() {
            tracing::info!("avatar connection lost, reconnecting");
            self.set_state(ConnectionState::Disconnected);
            self.set_status(notice::RECONNECTING);
            if let Err(e) = self.connect().await {
                tracing::error!("reconnect failed: {}", e);
                self.set_status(notice::CONNECTION_ERROR);
                return Err(e);
            }
        }
        let stream = self.stream.clone().ok_or(SessionError::NotConnected)?;
        self.backend.talk_stream(&stream, text, script_type).await
    }

    /// Runs one chat turn and has the avatar speak the reply.
    ///
    /// Blank input is ignored. Returns the completed reply, or `None` when
    /// nothing was sent or the model produced no text. A failed avatar talk
    /// is logged; the reply stays in the history.
    pub async fn send_message(&mut self, text: &str) -> Result<Option<String>, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        self.add_entry(Speaker::User, text, false);
        let prior = self.history.clone();
        self.history.push(Turn::user_text(text));
        let placeholder = self.add_entry(Speaker::Bot, "", true);

        // The frame rides along with this message only; history keeps the text.
        let mut parts = vec![Part::text(text)];
        parts.extend(self.capture_screen());
        let message = Turn {
            role: Role::User,
            parts,
        };

        match self.stream_reply(&prior, &message, placeholder).await {
            Ok(reply) => {
                if reply.is_empty() {
                    self.update_entry(placeholder, "");
                    return Ok(None);
                }
                self.history.push(Turn::model_text(reply.as_str()));
                if let Err(e) = self.talk(&reply, ScriptType::Text).await {
                    tracing::error!("avatar could not speak the reply: {}", e);
                }
                if let Some(voice) = &self.voice {
                    voice.reply_finished().await;
                }
                Ok(Some(reply))
            }
            Err(e) => {
                tracing::error!("chat turn failed: {}", e);
                self.history.pop();
                self.update_entry(placeholder, notice::REPLY_ERROR);
                Err(e)
            }
        }
    }

    async fn stream_reply(
        &mut self,
        prior: &[Turn],
        message: &Turn,
        placeholder: Uuid,
    ) -> Result<String, SessionError> {
        let mut fragments = self.backend.chat(prior, message).await?;
        let mut reply = String::new();
        while let Some(fragment) = fragments.next().await {
            reply.push_str(&fragment?);
            self.update_entry(placeholder, reply.as_str());
        }
        if is_relay_failure(&reply) {
            return Err(SessionError::RelayFailure);
        }
        Ok(reply)
    }

    /// Grabs a frame if sharing. A share ended from outside is cleaned up here.
    fn capture_screen(&mut self) -> Option<Part> {
        let active = self.screen.as_ref()?.is_active();
        if !active {
            self.stop_screen_share();
            return None;
        }
        match self.screen.as_ref()?.capture() {
            Ok(part) => Some(part),
            Err(e) => {
                tracing::error!("screen capture failed: {}", e);
                None
            }
        }
    }

    /// Starts sharing with a source from `open`, or stops the current share.
    pub async fn toggle_screen_share<F, Fut>(&mut self, open: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Box<dyn FrameSource>, SessionError>>,
    {
        if self.screen.is_some() {
            self.stop_screen_share();
            return;
        }
        match open().await {
            Ok(source) => self.start_screen_share(source),
            Err(e) => {
                tracing::error!("could not start screen share: {}", e);
                self.add_entry(Speaker::Bot, notice::SCREEN_SHARE_FAILED, false);
            }
        }
    }

    /// Replaces any current share with `source`.
    pub fn start_screen_share(&mut self, source: Box<dyn FrameSource>) {
        if let Some(previous) = self.screen.replace(ScreenShare::new(source)) {
            previous.stop();
        }
        self.add_entry(Speaker::Bot, notice::SCREEN_SHARE_STARTED, false);
    }

    pub fn stop_screen_share(&mut self) {
        if let Some(share) = self.screen.take() {
            share.stop();
            self.add_entry(Speaker::Bot, notice::SCREEN_SHARE_STOPPED, false);
        }
    }

    /// Routes reply notifications to the voice driver behind `voice`.
    pub fn attach_voice(&mut self, voice: VoiceHandle) {
        self.voice = Some(voice);
    }

    /// Applies one voice driver output. Utterances become chat turns.
    pub async fn handle_voice_output(&mut self, output: VoiceOutput) {
        match output {
            VoiceOutput::Utterance(text) => {
                self.emit(SessionEvent::Draft(String::new()));
                if let Err(e) = self.send_message(&text).await {
                    tracing::debug!("spoken turn failed: {}", e);
                }
            }
            VoiceOutput::Draft(text) => self.emit(SessionEvent::Draft(text)),
            VoiceOutput::Status(text) => self.set_status(text),
            VoiceOutput::Notice(text) => {
                self.add_entry(Speaker::Bot, text, false);
            }
        }
    }

    /// Consumes voice driver output until the driver stops.
    ///
    /// Turns run one at a time. Attach the driver's handle first so it
    /// hears about delivered replies and can resume listening.
    pub async fn run_voice_turns(&mut self, mut outputs: mpsc::Receiver<VoiceOutput>) {
        while let Some(output) = outputs.recv().await {
            self.handle_voice_output(output).await;
        }
    }

    /// Page teardown: closes the peer and fires off the stream close.
    pub async fn close(&mut self) {
        if let Some(share) = self.screen.take() {
            share.stop();
        }
        if let Some(peer) = self.peer.take() {
            peer.close().await;
        }
        if let Some(stream) = self.stream.take() {
            self.spawn_close(stream);
        }
        self.set_state(ConnectionState::Closed);
    }

    fn add_entry(&mut self, speaker: Speaker, text: &str, thinking: bool) -> Uuid {
        let entry = self.transcript.push(speaker, text, thinking);
        let id = entry.id;
        self.emit(SessionEvent::EntryAdded(entry));
        id
    }

    fn update_entry(&mut self, id: Uuid, text: &str) {
        if let Some(entry) = self.transcript.update(id, text) {
            self.emit(SessionEvent::EntryUpdated(entry));
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            self.state = state;
            self.emit(SessionEvent::State(state));
        }
    }

    fn set_status(&self, status: impl Into<String>) {
        self.emit(SessionEvent::Status(status.into()));
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

async fn wait_until_connected(states: &mut watch::Receiver<PeerState>) -> Result<(), SessionError> {
    loop {
        let state = *states.borrow_and_update();
        if state == PeerState::Connected {
            return Ok(());
        }
        if state.is_terminal() {
            return Err(SessionError::PeerState(state));
        }
        if states.changed().await.is_err() {
            return Err(SessionError::Peer("peer connection went away".to_string()));
        }
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state)
            .field("stream", &self.stream)
            .field("history_len", &self.history.len())
            .field("screen", &self.screen)
            .finish()
    }
}
