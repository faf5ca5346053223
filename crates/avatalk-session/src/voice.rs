//! Hands-free conversation mode.
//!
//! [`VoiceLoop`] is the pure state machine: it turns recognizer events and
//! user toggles into [`VoiceAction`]s and owns the silence deadline.
//! [`VoiceDriver`] runs it on a task, driving a [`SpeechRecognizer`] and
//! emitting [`VoiceOutput`]s for the controller to act on.

use crate::notice;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

/// Quiet period after a final transcript before it is sent.
pub const SILENCE_TIMEOUT: Duration = Duration::from_millis(1500);

/// Continuous speech recognizer, configured for Spanish with interim results.
pub trait SpeechRecognizer: Send + Sync {
    fn start(&self) -> Result<(), RecognitionError>;

    fn stop(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSegment {
    pub text: String,
    pub is_final: bool,
}

impl TranscriptSegment {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    /// Nothing was heard; conversation mode survives this one.
    #[error("no speech detected")]
    NoSpeech,
    #[error("speech recognition error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Started,
    Ended,
    /// Segments from the latest result index onward.
    Result(Vec<TranscriptSegment>),
    Error(RecognitionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceAction {
    StartRecognizer,
    StopRecognizer,
    Status(&'static str),
    Notice(&'static str),
    /// Show the pending transcript in the input field.
    Draft(String),
    Send(String),
}

#[derive(Debug)]
pub struct VoiceLoop {
    conversation_mode: bool,
    listening: bool,
    draft: Option<String>,
    deadline: Option<Instant>,
    silence: Duration,
}

impl Default for VoiceLoop {
    fn default() -> Self {
        Self::new(SILENCE_TIMEOUT)
    }
}

impl VoiceLoop {
    pub fn new(silence: Duration) -> Self {
        Self {
            conversation_mode: false,
            listening: false,
            draft: None,
            deadline: None,
            silence,
        }
    }

    pub fn conversation_mode(&self) -> bool {
        self.conversation_mode
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn toggle(&mut self) -> Vec<VoiceAction> {
        self.conversation_mode = !self.conversation_mode;
        if self.conversation_mode {
            vec![
                VoiceAction::StartRecognizer,
                VoiceAction::Notice(notice::CONVERSATION_ON),
            ]
        } else {
            vec![
                VoiceAction::StopRecognizer,
                VoiceAction::Status(notice::CLICK_TO_START),
                VoiceAction::Notice(notice::CONVERSATION_OFF),
            ]
        }
    }

    pub fn on_event(&mut self, event: RecognitionEvent, now: Instant) -> Vec<VoiceAction> {
        match event {
            RecognitionEvent::Started => {
                self.listening = true;
                vec![VoiceAction::Status(notice::LISTENING)]
            }
            RecognitionEvent::Ended => {
                self.listening = false;
                if self.conversation_mode {
                    vec![VoiceAction::StartRecognizer]
                } else {
                    vec![VoiceAction::Status(notice::CLICK_TO_START)]
                }
            }
            RecognitionEvent::Result(segments) => {
                // Any new speech postpones the send.
                self.deadline = None;
                let spoken: String = segments
                    .iter()
                    .filter(|s| s.is_final)
                    .map(|s| s.text.as_str())
                    .collect();
                let spoken = spoken.trim();
                if spoken.is_empty() {
                    return Vec::new();
                }
                self.draft = Some(spoken.to_string());
                self.deadline = Some(now + self.silence);
                vec![VoiceAction::Draft(spoken.to_string())]
            }
            RecognitionEvent::Error(RecognitionError::NoSpeech) => Vec::new(),
            RecognitionEvent::Error(RecognitionError::Other(reason)) => {
                tracing::warn!(%reason, "speech recognition failed, leaving conversation mode");
                self.conversation_mode = false;
                Vec::new()
            }
        }
    }

    /// Fires the silence timer. Sends the draft at most once per deadline.
    pub fn on_deadline(&mut self, now: Instant) -> Vec<VoiceAction> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                match self.draft.take() {
                    Some(text) if !text.is_empty() => vec![VoiceAction::Send(text)],
                    _ => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }

    /// Called after every bot reply.
    pub fn on_reply_finished(&mut self) -> Vec<VoiceAction> {
        if self.conversation_mode && !self.listening {
            vec![VoiceAction::StartRecognizer]
        } else {
            Vec::new()
        }
    }
}

/// What the driver hands to the session controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceOutput {
    Utterance(String),
    Draft(String),
    Status(&'static str),
    Notice(&'static str),
}

#[derive(Debug)]
enum VoiceInput {
    Toggle,
    Recognition(RecognitionEvent),
    ReplyFinished,
}

/// Feeds the driver. Wire recognizer callbacks to [`VoiceHandle::recognition`].
#[derive(Debug, Clone)]
pub struct VoiceHandle {
    tx: mpsc::Sender<VoiceInput>,
}

impl VoiceHandle {
    pub async fn toggle(&self) {
        self.send(VoiceInput::Toggle).await;
    }

    pub async fn recognition(&self, event: RecognitionEvent) {
        self.send(VoiceInput::Recognition(event)).await;
    }

    pub async fn reply_finished(&self) {
        self.send(VoiceInput::ReplyFinished).await;
    }

    async fn send(&self, input: VoiceInput) {
        if self.tx.send(input).await.is_err() {
            tracing::debug!("voice driver stopped; input dropped");
        }
    }
}

pub struct VoiceDriver {
    machine: VoiceLoop,
    recognizer: Arc<dyn SpeechRecognizer>,
    inputs: mpsc::Receiver<VoiceInput>,
    outputs: mpsc::Sender<VoiceOutput>,
}

impl VoiceDriver {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        silence: Duration,
    ) -> (Self, VoiceHandle, mpsc::Receiver<VoiceOutput>) {
        let (tx, inputs) = mpsc::channel(32);
        let (outputs, out_rx) = mpsc::channel(32);
        let driver = Self {
            machine: VoiceLoop::new(silence),
            recognizer,
            inputs,
            outputs,
        };
        (driver, VoiceHandle { tx }, out_rx)
    }

    /// Runs until every [`VoiceHandle`] is dropped or the output side closes.
    pub async fn run(mut self) {
        loop {
            let deadline = self.machine.deadline();
            let actions = tokio::select! {
                input = self.inputs.recv() => match input {
                    Some(VoiceInput::Toggle) => self.machine.toggle(),
                    Some(VoiceInput::Recognition(event)) => self.machine.on_event(event, Instant::now()),
                    Some(VoiceInput::ReplyFinished) => self.machine.on_reply_finished(),
                    None => break,
                },
                () = wait_for(deadline) => self.machine.on_deadline(Instant::now()),
            };
            if !self.apply(actions).await {
                break;
            }
        }
        self.recognizer.stop();
        tracing::debug!("voice driver finished");
    }

    async fn apply(&mut self, actions: Vec<VoiceAction>) -> bool {
        for action in actions {
            let output = match action {
                VoiceAction::StartRecognizer => {
                    if let Err(e) = self.recognizer.start() {
                        tracing::warn!("could not start speech recognition: {}", e);
                    }
                    continue;
                }
                VoiceAction::StopRecognizer => {
                    self.recognizer.stop();
                    continue;
                }
                VoiceAction::Status(text) => VoiceOutput::Status(text),
                VoiceAction::Notice(text) => VoiceOutput::Notice(text),
                VoiceAction::Draft(text) => VoiceOutput::Draft(text),
                VoiceAction::Send(text) => VoiceOutput::Utterance(text),
            };
            if self.outputs.send(output).await.is_err() {
                return false;
            }
        }
        true
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
