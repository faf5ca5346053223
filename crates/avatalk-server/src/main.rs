//! avatalk server binary.
//!
//! Starts an axum HTTP server with structured logging, loads the reference
//! document into memory, and shuts down gracefully on SIGTERM/SIGINT.

use avatalk_avatar::AvatarService;
use avatalk_llm::{ChatRelay, KnowledgeBase};
use avatalk_server::{app, config, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("AVATALK_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration: the server cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    if config.llm.api_key.is_empty() {
        tracing::warn!("GEMINI_API_KEY is not set; chat requests will be rejected upstream");
    }

    // Load the reference document once; every chat turn reuses it.
    let knowledge = KnowledgeBase::load(&config.llm.knowledge_path, &config.llm.knowledge_mime)
        .await
        .expect("failed to load knowledge document: check llm.knowledge_path in config");

    let chat = ChatRelay::from_config(config.llm.clone(), Arc::new(knowledge))
        .expect("failed to build LLM client");
    let avatar = AvatarService::new(config.avatar.clone())
        .expect("failed to build avatar client: check avatar.base_url in config");
    if !avatar.is_enabled() {
        tracing::warn!("DID_API_KEY is not set; avatar requests will be rejected upstream");
    }

    let state = AppState {
        chat: Arc::new(chat),
        avatar: Arc::new(avatar),
        static_dir: Some(config.server.static_dir.clone()),
    };

    // Build application
    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting avatalk server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address: is another process using this port?");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("avatalk server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
