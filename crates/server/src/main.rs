use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::protocol::{
    ChatRequest, ChatResponse, TranscribeResponse, CHAT_ROUTE, TRANSCRIBE_ROUTE,
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;
mod upstream;

use api::{status_for, ApiContext};
use app_state::AppState;
use config::{check_static_dir, load_settings};
use upstream::{OpenAiChat, OpenAiSpeechToText};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    check_static_dir(&settings.static_dir);
    if settings.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; every transcription will fail");
    }

    let stt = OpenAiSpeechToText::new(
        &settings.transcription_base_url,
        settings.openai_api_key.clone(),
        Duration::from_secs(settings.upstream_timeout_seconds),
    )?;
    info!(endpoint = %stt.endpoint(), model = %settings.transcription_model, "speech-to-text provider configured");
    let chat = OpenAiChat::new(
        &settings.transcription_base_url,
        settings.openai_api_key.clone(),
        settings.chat_model.clone(),
        Duration::from_secs(settings.upstream_timeout_seconds),
    )?;
    info!(endpoint = %chat.endpoint(), model = %settings.chat_model, "chat provider configured");

    let state = AppState {
        api: ApiContext {
            stt: Arc::new(stt),
            chat: Arc::new(chat),
            default_model: settings.transcription_model.clone(),
        },
        static_dir: settings.static_dir.clone(),
        max_audio_bytes: settings.max_audio_bytes,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "relay listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let transcribe_limit = DefaultBodyLimit::max(state.max_audio_bytes);
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            TRANSCRIBE_ROUTE,
            post(http_transcribe).layer(transcribe_limit),
        )
        .route(CHAT_ROUTE, post(http_chat))
        .nest_service("/static", ServeDir::new(&state.static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_transcribe(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> (StatusCode, Json<TranscribeResponse>) {
    match api::transcribe(&state.api, multipart).await {
        Ok(text) => (StatusCode::OK, Json(TranscribeResponse::success(text))),
        Err(err) => (status_for(err.code), Json(TranscribeResponse::from(err))),
    }
}

async fn http_chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> (StatusCode, Json<ChatResponse>) {
    match api::chat(&state.api, request).await {
        Ok(reply) => (StatusCode::OK, Json(ChatResponse::success(reply))),
        Err(err) => (status_for(err.code), Json(ChatResponse::from(err))),
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
