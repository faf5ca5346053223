//! Avatar stream proxy handlers.
//!
//! Each handler forwards one call to the avatar provider with the server's
//! credential and passes the provider's JSON back unchanged.

use crate::{api::ApiError, AppState};
use avatalk_types::{
    CloseStreamRequest, StartStreamRequest, TalkStreamRequest, STREAM_CLOSED_MESSAGE,
};
use axum::extract::{Extension, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// Handler for `POST /api/d-id/create-stream`.
pub async fn create_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let descriptor = state.avatar.create_stream().await.map_err(|e| {
        tracing::error!("create-stream failed: {}", e);
        ApiError::from(e)
    })?;
    Ok(Json(descriptor))
}

/// Handler for `POST /api/d-id/start-stream`.
pub async fn start_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<StartStreamRequest>,
) -> Result<Json<Value>, ApiError> {
    let ack = state
        .avatar
        .start_stream(&payload.stream_id, &payload.session_id, &payload.answer)
        .await
        .map_err(|e| {
            tracing::error!(stream_id = %payload.stream_id, "start-stream failed: {}", e);
            ApiError::from(e)
        })?;
    Ok(Json(ack))
}

/// Handler for `POST /api/d-id/talk-stream`.
pub async fn talk_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<TalkStreamRequest>,
) -> Result<Json<Value>, ApiError> {
    let ack = state
        .avatar
        .talk_stream(
            &payload.stream_id,
            &payload.session_id,
            &payload.text,
            payload.script_type,
        )
        .await
        .map_err(|e| {
            tracing::error!(
                stream_id = %payload.stream_id,
                script_type = payload.script_type.as_str(),
                "talk-stream failed: {}",
                e
            );
            ApiError::from(e)
        })?;
    Ok(Json(ack))
}

/// Handler for `POST /api/d-id/close-stream`.
///
/// Clients call this from a page-unload beacon and never read the reply.
pub async fn close_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CloseStreamRequest>,
) -> Result<Json<Value>, ApiError> {
    state
        .avatar
        .close_stream(&payload.stream_id, &payload.session_id)
        .await
        .map_err(|e| {
            tracing::error!(stream_id = %payload.stream_id, "close-stream failed: {}", e);
            ApiError::from(e)
        })?;
    Ok(Json(json!({ "message": STREAM_CLOSED_MESSAGE })))
}
