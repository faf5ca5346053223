//! Streaming chat relay handler.

use crate::AppState;
use avatalk_llm::TextStream;
use avatalk_types::{ChatRequest, RELAY_FAILURE_TEXT};
use axum::{
    body::Body,
    extract::{Extension, Json},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::stream::{self, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Handler for `POST /api/chat`.
///
/// Streams the model's reply as chunked `text/plain`, one write per provider
/// fragment. If the provider fails before the first fragment the response is
/// a 500 whose body is exactly [`RELAY_FAILURE_TEXT`]; a failure after that
/// point appends the same text and ends the body.
pub async fn chat_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let mut fragments = match state
        .chat
        .stream_reply(request.history, request.message)
        .await
    {
        Ok(fragments) => fragments,
        Err(e) => {
            tracing::error!("chat relay failed before streaming: {}", e);
            return failure_response();
        }
    };

    let first = match fragments.next().await {
        Some(Ok(text)) => text,
        Some(Err(e)) => {
            tracing::error!("chat relay failed before first fragment: {}", e);
            return failure_response();
        }
        None => return text_response(Body::empty()),
    };

    let body = stream::once(async move { Ok::<_, Infallible>(first) }).chain(relay_rest(fragments));
    text_response(Body::from_stream(body))
}

/// Forwards the remaining fragments, replacing a provider error with the
/// failure text as the final chunk.
fn relay_rest(
    fragments: TextStream,
) -> impl futures_util::Stream<Item = Result<String, Infallible>> + Send {
    stream::unfold(Some(fragments), |state| async move {
        let mut fragments = match state {
            Some(fragments) => fragments,
            None => return None,
        };
        match fragments.next().await {
            Some(Ok(text)) => Some((Ok(text), Some(fragments))),
            Some(Err(e)) => {
                tracing::error!("chat relay failed mid-stream: {}", e);
                Some((Ok(RELAY_FAILURE_TEXT.to_string()), None))
            }
            None => None,
        }
    })
}

fn text_response(body: Body) -> Response {
    ([(header::CONTENT_TYPE, TEXT_PLAIN)], body).into_response()
}

fn failure_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, TEXT_PLAIN)],
        RELAY_FAILURE_TEXT,
    )
        .into_response()
}
