use std::path::PathBuf;

use async_trait::async_trait;
use shared::domain::AudioUploadMeta;
use tracing::{debug, info};

use crate::error::CaptureError;

/// Encoded audio handed from the capture device to the transcriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    pub bytes: Vec<u8>,
    pub meta: AudioUploadMeta,
}

impl AudioPayload {
    pub fn webm(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            meta: AudioUploadMeta::default(),
        }
    }
}

#[async_trait]
pub trait AudioCapture: Send {
    /// Opens the microphone and begins buffering.
    async fn start(&mut self) -> Result<(), CaptureError>;
    /// Closes the microphone and yields everything captured since `start`.
    async fn stop(&mut self) -> Result<AudioPayload, CaptureError>;
    /// Closes the microphone and drops the buffered audio.
    async fn abort(&mut self);
}

/// Capture that "records" a pre-encoded clip from disk. Used by the terminal
/// viewer in place of a microphone.
#[derive(Debug)]
pub struct FileCapture {
    path: PathBuf,
    meta: AudioUploadMeta,
    recording: bool,
}

impl FileCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut meta = AudioUploadMeta::default();
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            meta.filename = name.to_string();
        }
        if let Some(mime) = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(mime_for_extension)
        {
            meta.mime_type = mime.to_string();
        }
        Self {
            path,
            meta,
            recording: false,
        }
    }
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "webm" => Some("audio/webm"),
        "wav" => Some("audio/wav"),
        "mp3" => Some("audio/mpeg"),
        "ogg" => Some("audio/ogg"),
        "m4a" => Some("audio/mp4"),
        _ => None,
    }
}

#[async_trait]
impl AudioCapture for FileCapture {
    async fn start(&mut self) -> Result<(), CaptureError> {
        tokio::fs::metadata(&self.path).await.map_err(|e| {
            CaptureError::DeviceUnavailable(format!("{}: {e}", self.path.display()))
        })?;
        self.recording = true;
        info!(path = %self.path.display(), "capture started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<AudioPayload, CaptureError> {
        if !self.recording {
            return Err(CaptureError::NotRecording);
        }
        self.recording = false;
        let bytes = tokio::fs::read(&self.path).await?;
        debug!(bytes = bytes.len(), "capture stopped");
        Ok(AudioPayload {
            bytes,
            meta: self.meta.clone(),
        })
    }

    async fn abort(&mut self) {
        self.recording = false;
    }
}
