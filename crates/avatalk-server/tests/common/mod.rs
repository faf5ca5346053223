//! Fake upstream providers and state builders shared by the API tests.

#![allow(dead_code)]

use avatalk_avatar::{AvatarConfig, AvatarService};
use avatalk_llm::{ChatRelay, GeminiConfig, KnowledgeBase};
use avatalk_server::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// Fragments streamed by the fake LLM for an ordinary prompt.
pub const FRAGMENTS: [&str; 3] = ["Hola, ", "soy Alex. ", "¿En qué te ayudo?"];

#[derive(Debug, Clone)]
pub struct UpstreamCall {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone, Default)]
pub struct Upstream {
    pub calls: Arc<Mutex<Vec<UpstreamCall>>>,
}

impl Upstream {
    fn record(&self, path: String, headers: &HeaderMap, body: Value) {
        let authorization = headers
            .get("authorization")
            .or_else(|| headers.get("x-goog-api-key"))
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.calls.lock().unwrap().push(UpstreamCall {
            path,
            authorization,
            body,
        });
    }

    pub fn calls(&self) -> Vec<UpstreamCall> {
        self.calls.lock().unwrap().clone()
    }
}

fn sse(frames: &[Value]) -> String {
    frames
        .iter()
        .map(|frame| format!("data: {}\n\n", frame))
        .collect()
}

fn text_frame(text: &str) -> Value {
    json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]})
}

/// Fake `streamGenerateContent`; the last text part of the request selects the scenario.
async fn generate(
    State(upstream): State<Upstream>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let prompt = body["contents"]
        .as_array()
        .and_then(|c| c.last())
        .and_then(|turn| turn["parts"].as_array())
        .and_then(|parts| parts.iter().rev().find_map(|p| p["text"].as_str()))
        .unwrap_or_default()
        .to_string();
    upstream.record(format!("/v1beta/models/{}", call), &headers, body);

    let (status, payload) = match prompt.as_str() {
        "reject" => (
            StatusCode::TOO_MANY_REQUESTS,
            json!({"error": {"code": 429, "message": "Resource exhausted"}}).to_string(),
        ),
        "fail-first" => (
            StatusCode::OK,
            sse(&[json!({"error": {"code": 500, "message": "Internal error"}})]),
        ),
        "break" => (
            StatusCode::OK,
            sse(&[
                text_frame("Hola"),
                json!({"error": {"code": 500, "message": "Internal error"}}),
            ]),
        ),
        "silent" => (StatusCode::OK, String::new()),
        _ => (
            StatusCode::OK,
            sse(&FRAGMENTS.iter().map(|t| text_frame(t)).collect::<Vec<_>>()),
        ),
    };

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .body(Body::from(payload))
        .unwrap()
}

async fn create_stream(
    State(upstream): State<Upstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    upstream.record("/talks/streams".into(), &headers, body);
    Json(json!({
        "id": "strm_1",
        "session_id": "sess_1",
        "offer": {"type": "offer", "sdp": "v=0"},
        "ice_servers": [{"urls": ["stun:stun.example.com"]}],
        "created_at": "2025-01-01T00:00:00.000Z"
    }))
}

async fn sdp(
    State(upstream): State<Upstream>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    upstream.record(format!("/talks/streams/{}/sdp", id), &headers, body);
    Json(json!({"status": "success"}))
}

async fn talk(
    State(upstream): State<Upstream>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    upstream.record(format!("/talks/streams/{}", id), &headers, body);
    if id == "missing" {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"kind": "ValidationError", "description": "Stream not found"})),
        )
    } else {
        (StatusCode::OK, Json(json!({"status": "started"})))
    }
}

async fn close(
    State(upstream): State<Upstream>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    upstream.record(format!("DELETE /talks/streams/{}", id), &headers, body);
    StatusCode::NOT_FOUND
}

/// Starts a fake upstream serving both provider APIs; returns its base URL.
pub async fn start_upstream() -> (String, Upstream) {
    let upstream = Upstream::default();
    let app = Router::new()
        .route("/v1beta/models/{call}", post(generate))
        .route("/talks/streams", post(create_stream))
        .route("/talks/streams/{id}/sdp", post(sdp))
        .route("/talks/streams/{id}", post(talk).delete(close))
        .with_state(upstream.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), upstream)
}

/// Builds app state whose providers both point at `upstream_url`.
pub fn build_test_state(upstream_url: &str, static_dir: Option<PathBuf>) -> AppState {
    let knowledge = KnowledgeBase::from_bytes(b"%PDF-1.4 guide", "application/pdf").unwrap();
    let chat = ChatRelay::from_config(
        GeminiConfig::new(upstream_url, "gemini-key"),
        Arc::new(knowledge),
    )
    .unwrap();
    let avatar = AvatarService::new(AvatarConfig::new(upstream_url, "did-key")).unwrap();

    AppState {
        chat: Arc::new(chat),
        avatar: Arc::new(avatar),
        static_dir,
    }
}

pub fn json_request(uri: &str, body: Value) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
