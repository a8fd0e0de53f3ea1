use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use serde::Deserialize;
use serde_json::json;
use shared::{domain::AudioUploadMeta, protocol::ChatMessage};
use tracing::{info, warn};
use url::Url;

/// Audio received on `/transcribe`, ready to forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioUpload {
    pub bytes: Vec<u8>,
    pub meta: AudioUploadMeta,
    pub model: String,
}

#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, upload: AudioUpload) -> anyhow::Result<String>;
}

#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, messages: Vec<ChatMessage>) -> anyhow::Result<String>;
}

/// OpenAI-compatible `audio/transcriptions` endpoint.
pub struct OpenAiSpeechToText {
    http: Client,
    endpoint: Url,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionBody {
    text: String,
}

/// OpenAI-compatible `chat/completions` endpoint.
pub struct OpenAiChat {
    http: Client,
    endpoint: Url,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct CompletionBody {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProviderError {
    Detailed { message: String },
    Plain(String),
}

impl OpenAiSpeechToText {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            endpoint: provider_endpoint(base_url, "audio/transcriptions")?,
            api_key,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl OpenAiChat {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            endpoint: provider_endpoint(base_url, "chat/completions")?,
            api_key,
            model: model.into(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Joins `path` onto the provider base url, keeping any base path.
fn provider_endpoint(base_url: &str, path: &str) -> anyhow::Result<Url> {
    let mut base = Url::parse(base_url.trim())
        .with_context(|| format!("invalid provider base url '{base_url}'"))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(path)?)
}

/// Message from a provider error body, or the bare status when the body is
/// not one of the known shapes.
fn provider_error(status: reqwest::StatusCode, body: &[u8]) -> anyhow::Error {
    let message = serde_json::from_slice::<ProviderErrorBody>(body)
        .map(|body| match body.error {
            ProviderError::Detailed { message } | ProviderError::Plain(message) => message,
        })
        .unwrap_or_else(|_| format!("provider returned {status}"));
    anyhow!(message)
}

#[async_trait]
impl SpeechToText for OpenAiSpeechToText {
    async fn transcribe(&self, upload: AudioUpload) -> anyhow::Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("OPENAI_API_KEY is not configured on the server");
        };

        let size = upload.bytes.len();
        let file = Part::bytes(upload.bytes)
            .file_name(upload.meta.filename)
            .mime_str(&upload.meta.mime_type)?;
        let form = Form::new()
            .part("file", file)
            .text("model", upload.model.clone());

        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .context("transcription provider unreachable")?;
        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            let parsed: TranscriptionBody = serde_json::from_slice(&body)
                .context("transcription provider returned an unexpected body")?;
            info!(bytes = size, model = %upload.model, "transcribed upload");
            return Ok(parsed.text);
        }

        warn!(status = status.as_u16(), "transcription provider rejected upload");
        Err(provider_error(status, &body))
    }
}

#[async_trait]
impl ChatCompletion for OpenAiChat {
    async fn complete(&self, messages: Vec<ChatMessage>) -> anyhow::Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("OPENAI_API_KEY is not configured on the server");
        };

        let turns = messages.len();
        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(&json!({ "model": self.model, "messages": messages }))
            .send()
            .await
            .context("chat provider unreachable")?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "chat provider rejected request");
            return Err(provider_error(status, &body));
        }

        let parsed: CompletionBody = serde_json::from_slice(&body)
            .context("chat provider returned an unexpected body")?;
        let Some(choice) = parsed.choices.into_iter().next() else {
            bail!("chat provider returned no choices");
        };
        info!(turns, model = %self.model, "chat completed");
        Ok(choice.message.content.unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "tests/upstream_tests.rs"]
mod tests;
