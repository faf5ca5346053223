//! avatalk server library logic.
//!
//! Relays chat turns to the LLM and proxies the avatar provider's stream
//! API so provider credentials stay on the server.

pub mod api;
pub mod api_avatar;
pub mod api_chat;
pub mod config;

use avatalk_avatar::AvatarService;
use avatalk_llm::ChatRelay;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// LLM relay with the preloaded reference document.
    pub chat: Arc<ChatRelay>,
    /// Avatar provider client.
    pub avatar: Arc<AvatarService>,
    /// Directory of browser client files, served at `/` when present.
    pub static_dir: Option<PathBuf>,
}

/// Maximum request body size (16 MiB). Chat turns may carry an inline
/// screen capture, so this is well above a text-only payload.
const MAX_REQUEST_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(api_chat::chat_handler))
        .route(
            "/api/d-id/create-stream",
            post(api_avatar::create_stream_handler),
        )
        .route(
            "/api/d-id/start-stream",
            post(api_avatar::start_stream_handler),
        )
        .route(
            "/api/d-id/talk-stream",
            post(api_avatar::talk_stream_handler),
        )
        .route(
            "/api/d-id/close-stream",
            post(api_avatar::close_stream_handler),
        );

    // Serve the browser client if the directory exists.
    let router = match state.static_dir.as_deref() {
        Some(dir) if dir.is_dir() => {
            tracing::info!(path = %dir.display(), "serving client static files");
            let index = dir.join("index.html");
            if index.exists() {
                router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)))
            } else {
                router.fallback_service(ServeDir::new(dir))
            }
        }
        Some(dir) => {
            tracing::info!(path = %dir.display(), "static directory not found, skipping static file serving");
            router
        }
        None => router,
    };

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
