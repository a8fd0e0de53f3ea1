use std::sync::Arc;

use axum::extract::{multipart::MultipartError, Multipart};
use axum::http::StatusCode;
use shared::{
    domain::AudioUploadMeta,
    error::{ApiError, ErrorCode},
    protocol::ChatRequest,
};
use tracing::{debug, error};

use crate::upstream::{AudioUpload, ChatCompletion, SpeechToText};

pub const MISSING_AUDIO_MESSAGE: &str = "No audio file provided";

#[derive(Clone)]
pub struct ApiContext {
    pub stt: Arc<dyn SpeechToText>,
    pub chat: Arc<dyn ChatCompletion>,
    pub default_model: String,
}

/// Pulls the `file` and optional `model` fields out of a `/transcribe` form.
pub async fn read_transcribe_form(
    mut multipart: Multipart,
    default_model: &str,
) -> Result<AudioUpload, ApiError> {
    let mut audio: Option<(Vec<u8>, AudioUploadMeta)> = None;
    let mut model: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let defaults = AudioUploadMeta::default();
                let meta = AudioUploadMeta {
                    filename: field
                        .file_name()
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(str::to_string)
                        .unwrap_or(defaults.filename),
                    mime_type: field
                        .content_type()
                        .map(str::to_string)
                        .unwrap_or(defaults.mime_type),
                };
                let bytes = field.bytes().await.map_err(multipart_error)?;
                audio = Some((bytes.to_vec(), meta));
            }
            Some("model") => {
                let value = field.text().await.map_err(multipart_error)?;
                let value = value.trim();
                if !value.is_empty() {
                    model = Some(value.to_string());
                }
            }
            other => debug!(field = ?other, "ignoring unexpected form field"),
        }
    }

    let Some((bytes, meta)) = audio.filter(|(bytes, _)| !bytes.is_empty()) else {
        return Err(ApiError::validation(MISSING_AUDIO_MESSAGE));
    };
    Ok(AudioUpload {
        bytes,
        meta,
        model: model.unwrap_or_else(|| default_model.to_string()),
    })
}

pub async fn transcribe(ctx: &ApiContext, multipart: Multipart) -> Result<String, ApiError> {
    let upload = read_transcribe_form(multipart, &ctx.default_model).await?;
    ctx.stt.transcribe(upload).await.map_err(|e| {
        error!(error = %e, "transcription failed");
        ApiError::upstream(e.to_string())
    })
}

pub async fn chat(ctx: &ApiContext, request: ChatRequest) -> Result<String, ApiError> {
    ctx.chat
        .complete(request.into_messages())
        .await
        .map_err(|e| {
            error!(error = %e, "chat completion failed");
            ApiError::upstream(e.to_string())
        })
}

pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorCode::Upstream => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(ErrorCode::PayloadTooLarge, err.body_text())
    } else {
        ApiError::validation(err.body_text())
    }
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
