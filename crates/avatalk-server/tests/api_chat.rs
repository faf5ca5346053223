mod common;

use avatalk_server::app;
use avatalk_types::RELAY_FAILURE_TEXT;
use axum::http::{header, StatusCode};
use common::{build_test_state, json_request, start_upstream, FRAGMENTS};
use futures_util::StreamExt;
use serde_json::json;
use tower::ServiceExt;

fn chat_body(text: &str) -> serde_json::Value {
    json!({
        "history": [
            {"role": "user", "parts": [{"text": "hola"}]},
            {"role": "model", "parts": [{"text": "¡Hola! ¿En qué te ayudo?"}]}
        ],
        "message": {"role": "user", "parts": [{"text": text}]}
    })
}

#[tokio::test]
async fn chat_streams_each_fragment_in_order() {
    let (url, _upstream) = start_upstream().await;
    let app = app(build_test_state(&url, None));

    let response = app
        .oneshot(json_request("/api/chat", chat_body("¿quién eres?")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );

    let mut frames = Vec::new();
    let mut body = response.into_body().into_data_stream();
    while let Some(frame) = body.next().await {
        frames.push(String::from_utf8(frame.unwrap().to_vec()).unwrap());
    }
    assert_eq!(frames, FRAGMENTS);
}

#[tokio::test]
async fn chat_forwards_history_and_attaches_document() {
    let (url, upstream) = start_upstream().await;
    let app = app(build_test_state(&url, None));

    let mut body = chat_body("¿qué ves?");
    body["message"]["parts"]
        .as_array_mut()
        .unwrap()
        .push(json!({"inline_data": {"mime_type": "image/jpeg", "data": "/9j/4AAQ"}}));

    let response = app.oneshot(json_request("/api/chat", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let calls = upstream.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].path,
        "/v1beta/models/gemini-2.5-flash:streamGenerateContent"
    );
    assert_eq!(calls[0].authorization.as_deref(), Some("gemini-key"));

    let contents = calls[0].body["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[0]["parts"][0]["text"], "hola");
    let parts = contents[2]["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 4);
    assert_eq!(parts[1]["inline_data"]["mime_type"], "application/pdf");
    assert_eq!(parts[2]["text"], "¿qué ves?");
    assert_eq!(parts[3]["inline_data"]["data"], "/9j/4AAQ");
}

#[tokio::test]
async fn provider_rejection_returns_exact_failure_text() {
    let (url, _upstream) = start_upstream().await;
    let app = app(build_test_state(&url, None));

    for prompt in ["reject", "fail-first"] {
        let response = app
            .clone()
            .oneshot(json_request("/api/chat", chat_body(prompt)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{}", prompt);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, RELAY_FAILURE_TEXT.as_bytes(), "{}", prompt);
    }
}

#[tokio::test]
async fn unreachable_provider_returns_failure_text() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let app = app(build_test_state(&format!("http://{}", addr), None));
    let response = app
        .oneshot(json_request("/api/chat", chat_body("hola")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(body, RELAY_FAILURE_TEXT.as_bytes());
}

#[tokio::test]
async fn mid_stream_failure_appends_failure_text() {
    let (url, _upstream) = start_upstream().await;
    let app = app(build_test_state(&url, None));

    let response = app
        .oneshot(json_request("/api/chat", chat_body("break")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(body, format!("Hola{}", RELAY_FAILURE_TEXT).as_bytes());
}

#[tokio::test]
async fn empty_completion_is_an_empty_ok() {
    let (url, _upstream) = start_upstream().await;
    let app = app(build_test_state(&url, None));

    let response = app
        .oneshot(json_request("/api/chat", chat_body("silent")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn chat_is_streamed_over_http() {
    let (url, _upstream) = start_upstream().await;
    let app = app(build_test_state(&url, None));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let response = reqwest::Client::new()
        .post(format!("http://{}/api/chat", addr))
        .json(&chat_body("hola"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert!(response.headers().get("content-length").is_none());
    assert_eq!(response.text().await.unwrap(), FRAGMENTS.concat());
}
