use super::*;
use std::{
    env, fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use axum::{body, body::Body, http::Request};
use tower::ServiceExt;

use crate::upstream::{AudioUpload, ChatCompletion, SpeechToText};
use shared::protocol::{ChatMessage, DEFAULT_SYSTEM_PROMPT};

const BOUNDARY: &str = "relay-route-boundary";

struct FixedStt(Result<&'static str, &'static str>);

#[async_trait]
impl SpeechToText for FixedStt {
    async fn transcribe(&self, _upload: AudioUpload) -> anyhow::Result<String> {
        self.0.map(str::to_string).map_err(anyhow::Error::msg)
    }
}

/// Echoes the conversation it was sent as `role:content` lines, or fails.
struct EchoChat(Result<(), &'static str>);

#[async_trait]
impl ChatCompletion for EchoChat {
    async fn complete(&self, messages: Vec<ChatMessage>) -> anyhow::Result<String> {
        self.0.map_err(anyhow::Error::msg)?;
        Ok(messages
            .iter()
            .map(|m| format!("{}:{}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

fn unique_static_dir() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    env::temp_dir().join(format!("panorama-relay-static-{nanos}"))
}

fn test_app(reply: Result<&'static str, &'static str>, static_dir: PathBuf) -> Router {
    app_with_chat(reply, Ok(()), static_dir)
}

fn app_with_chat(
    reply: Result<&'static str, &'static str>,
    chat: Result<(), &'static str>,
    static_dir: PathBuf,
) -> Router {
    build_router(Arc::new(AppState {
        api: ApiContext {
            stt: Arc::new(FixedStt(reply)),
            chat: Arc::new(EchoChat(chat)),
            default_model: "whisper-1".into(),
        },
        static_dir,
        max_audio_bytes: 1024,
    }))
}

fn transcribe_request(file: Option<&[u8]>) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"model\"\r\n\r\nwhisper-1\r\n"
        )
        .as_bytes(),
    );
    if let Some(bytes) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"audio.webm\"\r\nContent-Type: audio/webm\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::post(TRANSCRIBE_ROUTE)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let app = test_app(Ok(""), unique_static_dir());
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn transcribe_returns_text_on_success() {
    let app = test_app(Ok("note from the kitchen"), unique_static_dir());
    let response = app
        .oneshot(transcribe_request(Some(b"webm-bytes")))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({ "text": "note from the kitchen" })
    );
}

#[tokio::test]
async fn transcribe_without_file_is_bad_request() {
    let app = test_app(Ok("unused"), unique_static_dir());
    let response = app
        .oneshot(transcribe_request(None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({ "error": "No audio file provided" })
    );
}

#[tokio::test]
async fn provider_failure_is_reported_as_server_error() {
    let app = test_app(Err("invalid api key"), unique_static_dir());
    let response = app
        .oneshot(transcribe_request(Some(b"webm-bytes")))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({ "error": "invalid api key" })
    );
}

#[tokio::test]
async fn oversized_audio_is_rejected() {
    let app = test_app(Ok("unused"), unique_static_dir());
    let response = app
        .oneshot(transcribe_request(Some(&[0u8; 4096])))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = json_body(response).await;
    assert!(body.get("text").is_none());
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn panorama_images_are_served_from_static_dir() {
    let static_dir = unique_static_dir();
    let panoramas = static_dir.join("panorama_input");
    fs::create_dir_all(&panoramas).expect("dir");
    fs::write(panoramas.join("panorama_1.jpg"), b"jpeg").expect("write");

    let app = test_app(Ok(""), static_dir.clone());
    let request = Request::get("/static/panorama_input/panorama_1.jpg")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"jpeg");

    let _ = fs::remove_dir_all(static_dir);
}

fn chat_request(body: serde_json::Value) -> Request<Body> {
    Request::post(CHAT_ROUTE)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn chat_passes_conversation_through() {
    let app = test_app(Ok(""), unique_static_dir());
    let response = app
        .oneshot(chat_request(serde_json::json!({
            "messages": [
                { "role": "system", "content": "Be brief." },
                { "role": "user", "content": "where am I?" }
            ]
        })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({ "reply": "system:Be brief.\nuser:where am I?" })
    );
}

#[tokio::test]
async fn chat_single_message_gets_default_system_prompt() {
    let app = test_app(Ok(""), unique_static_dir());
    let response = app
        .oneshot(chat_request(serde_json::json!({ "message": "hello" })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({ "reply": format!("system:{DEFAULT_SYSTEM_PROMPT}\nuser:hello") })
    );
}

#[tokio::test]
async fn chat_provider_failure_is_reported_as_server_error() {
    let app = app_with_chat(Ok(""), Err("model overloaded"), unique_static_dir());
    let response = app
        .oneshot(chat_request(serde_json::json!({ "message": "hello" })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({ "error": "model overloaded" })
    );
}
