#![allow(dead_code)]

use async_trait::async_trait;
use avatalk_session::{
    AvatarSession, Backend, ChatStream, Frame, FrameSource, PeerConnection, PeerFactory,
    PeerState, RecognitionError, SessionError, SpeechRecognizer,
};
use avatalk_types::{
    IceServer, IceUrls, ScriptType, SessionDescription, StreamDescriptor, Turn, RELAY_FAILURE_TEXT,
};
use futures_util::stream;
use futures_util::StreamExt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// How the fake relay answers the next chat turn.
#[derive(Debug, Clone)]
pub enum ChatScript {
    Fragments(Vec<&'static str>),
    /// Non-2xx before any body.
    Reject,
    /// Partial reply followed by the failure marker.
    FailMidStream(&'static str),
}

#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<String>>,
    chats: Mutex<Vec<(Vec<Turn>, Turn)>>,
    scripts: Mutex<VecDeque<ChatScript>>,
    streams_created: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, script: ChatScript) {
        self.scripts.lock().unwrap().push_back(script);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn chats(&self) -> Vec<(Vec<Turn>, Turn)> {
        self.chats.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn create_stream(&self) -> Result<StreamDescriptor, SessionError> {
        let n = self.streams_created.fetch_add(1, Ordering::SeqCst) + 1;
        self.record("create".to_string());
        Ok(StreamDescriptor {
            id: format!("strm_{}", n),
            session_id: format!("sess_{}", n),
            ice_servers: vec![IceServer {
                urls: IceUrls::One("stun:stun.example.com".into()),
                username: None,
                credential: None,
            }],
            offer: SessionDescription {
                kind: "offer".into(),
                sdp: "v=0 offer".into(),
            },
        })
    }

    async fn start_stream(
        &self,
        session: &AvatarSession,
        answer: &SessionDescription,
    ) -> Result<(), SessionError> {
        self.record(format!("start {} {}", session.stream_id, answer.kind));
        Ok(())
    }

    async fn talk_stream(
        &self,
        session: &AvatarSession,
        text: &str,
        script_type: ScriptType,
    ) -> Result<(), SessionError> {
        self.record(format!(
            "talk {} {} {}",
            session.stream_id,
            script_type.as_str(),
            text
        ));
        Ok(())
    }

    async fn close_stream(&self, session: &AvatarSession) -> Result<(), SessionError> {
        self.record(format!("close {}", session.stream_id));
        Ok(())
    }

    async fn chat(&self, history: &[Turn], message: &Turn) -> Result<ChatStream, SessionError> {
        self.chats
            .lock()
            .unwrap()
            .push((history.to_vec(), message.clone()));
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ChatScript::Fragments(vec!["Hola, ", "soy Alex."]));
        match script {
            ChatScript::Fragments(parts) => Ok(stream::iter(
                parts.into_iter().map(|p| Ok(p.to_string())).collect::<Vec<_>>(),
            )
            .boxed()),
            ChatScript::Reject => Err(SessionError::Server(RELAY_FAILURE_TEXT.to_string())),
            ChatScript::FailMidStream(partial) => Ok(stream::iter(vec![
                Ok(partial.to_string()),
                Ok(RELAY_FAILURE_TEXT.to_string()),
            ])
            .boxed()),
        }
    }
}

pub struct FakePeer {
    state: watch::Sender<PeerState>,
    after_answer: PeerState,
    closed: AtomicBool,
    remote: Mutex<Option<SessionDescription>>,
}

impl FakePeer {
    pub fn set_state(&self, state: PeerState) {
        self.state.send_replace(state);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn remote(&self) -> Option<SessionDescription> {
        self.remote.lock().unwrap().clone()
    }
}

#[async_trait]
impl PeerConnection for FakePeer {
    async fn set_remote_description(&self, offer: &SessionDescription) -> Result<(), SessionError> {
        *self.remote.lock().unwrap() = Some(offer.clone());
        Ok(())
    }

    async fn create_answer(&self) -> Result<SessionDescription, SessionError> {
        Ok(SessionDescription::answer("v=0 answer"))
    }

    async fn set_local_description(&self, _answer: &SessionDescription) -> Result<(), SessionError> {
        self.state.send_replace(self.after_answer);
        Ok(())
    }

    fn states(&self) -> watch::Receiver<PeerState> {
        self.state.subscribe()
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.state.send_replace(PeerState::Closed);
    }
}

/// Hands out peers that settle into the queued states, `Connected` by default.
#[derive(Default)]
pub struct FakePeers {
    outcomes: Mutex<VecDeque<PeerState>>,
    created: Mutex<Vec<Arc<FakePeer>>>,
}

impl FakePeers {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn next_settles_in(&self, state: PeerState) {
        self.outcomes.lock().unwrap().push_back(state);
    }

    pub fn created(&self) -> Vec<Arc<FakePeer>> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl PeerFactory for FakePeers {
    async fn create(&self, _ice_servers: &[IceServer]) -> Result<Arc<dyn PeerConnection>, SessionError> {
        let after_answer = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PeerState::Connected);
        let (state, _) = watch::channel(PeerState::New);
        let peer = Arc::new(FakePeer {
            state,
            after_answer,
            closed: AtomicBool::new(false),
            remote: Mutex::new(None),
        });
        self.created.lock().unwrap().push(peer.clone());
        Ok(peer)
    }
}

pub struct StillScreen {
    pub active: Arc<AtomicBool>,
}

impl StillScreen {
    pub fn new() -> (Box<dyn FrameSource>, Arc<AtomicBool>) {
        let active = Arc::new(AtomicBool::new(true));
        (
            Box::new(Self {
                active: active.clone(),
            }),
            active,
        )
    }
}

impl FrameSource for StillScreen {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn grab(&self) -> Result<Frame, SessionError> {
        Ok(Frame {
            width: 4,
            height: 4,
            rgba: [10, 120, 200, 255].repeat(16),
        })
    }

    fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeRecognizer {
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
}

impl SpeechRecognizer for FakeRecognizer {
    fn start(&self) -> Result<(), RecognitionError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Lets spawned fire-and-forget tasks run.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
