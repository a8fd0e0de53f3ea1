use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use shared::protocol::{TranscribeResponse, TRANSCRIBE_ROUTE};
use tracing::{info, warn};
use url::Url;

use crate::{capture::AudioPayload, error::TranscriptionError};

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: AudioPayload) -> Result<String, TranscriptionError>;
}

/// Posts recordings to the relay's `/transcribe` endpoint.
pub struct HttpTranscriber {
    http: Client,
    endpoint: Url,
    model: String,
}

impl HttpTranscriber {
    pub fn new(
        server_url: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TranscriptionError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: transcribe_endpoint(server_url)?,
            model: model.into(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Appends the transcribe route to `server_url`, keeping any base path.
pub fn transcribe_endpoint(server_url: &str) -> Result<Url, url::ParseError> {
    let mut base = Url::parse(server_url.trim())?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(TRANSCRIBE_ROUTE.trim_start_matches('/'))
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, audio: AudioPayload) -> Result<String, TranscriptionError> {
        let size = audio.bytes.len();
        let file = Part::bytes(audio.bytes)
            .file_name(audio.meta.filename)
            .mime_str(&audio.meta.mime_type)?;
        let form = Form::new()
            .part("file", file)
            .text("model", self.model.clone());

        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        let Ok(parsed) = serde_json::from_slice::<TranscribeResponse>(&body) else {
            warn!(status = status.as_u16(), "transcription response was not JSON");
            return Err(TranscriptionError::UnexpectedResponse {
                status: status.as_u16(),
            });
        };

        if parsed.is_success() {
            info!(bytes = size, "transcription received");
            return Ok(parsed.into_note());
        }
        match parsed.error {
            Some(message) if !message.is_empty() => Err(TranscriptionError::Service(message)),
            _ if status.is_success() => Ok(String::new()),
            _ => Err(TranscriptionError::UnexpectedResponse {
                status: status.as_u16(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "tests/transcription_tests.rs"]
mod tests;
