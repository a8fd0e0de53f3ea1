//! In-memory stand-ins for the engine, the microphone and the transcriber.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use glam::{Mat4, Vec2};
use shared::domain::VisualId;

use crate::{
    capture::{AudioCapture, AudioPayload},
    error::{CaptureError, TranscriptionError},
    geometry::{Camera, Viewport},
    scene::{MarkerVisual, SceneBackend},
    transcription::Transcriber,
    workflow::ControlStates,
};

#[derive(Debug, Default)]
pub(crate) struct SceneLog {
    next_id: u64,
    pub panorama_source: Option<String>,
    pub visuals: BTreeMap<VisualId, MarkerVisual>,
    pub removed: Vec<VisualId>,
    pub tooltip: Option<(Vec2, String)>,
    pub notifications: Vec<String>,
    pub controls: Vec<ControlStates>,
}

pub(crate) struct FakeScene {
    log: Arc<Mutex<SceneLog>>,
    camera: Camera,
    viewport: Viewport,
}

impl FakeScene {
    pub fn new() -> (Self, Arc<Mutex<SceneLog>>) {
        let log = Arc::new(Mutex::new(SceneLog::default()));
        let viewport = Viewport::new(800.0, 600.0);
        let scene = Self {
            log: log.clone(),
            camera: Camera::panorama(0.0, 0.0, viewport.aspect()),
            viewport,
        };
        (scene, log)
    }
}

impl SceneBackend for FakeScene {
    fn set_panorama_source(&mut self, resource: &str) {
        self.log.lock().expect("log").panorama_source = Some(resource.to_string());
    }

    fn create_marker_visual(&mut self, visual: MarkerVisual) -> VisualId {
        let mut log = self.log.lock().expect("log");
        log.next_id += 1;
        let id = VisualId(log.next_id);
        log.visuals.insert(id, visual);
        id
    }

    fn remove_marker_visual(&mut self, id: VisualId) {
        let mut log = self.log.lock().expect("log");
        log.visuals.remove(&id);
        log.removed.push(id);
    }

    fn camera_transform(&self) -> Mat4 {
        self.camera.view_projection()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn show_tooltip(&mut self, at: Vec2, text: &str) {
        self.log.lock().expect("log").tooltip = Some((at, text.to_string()));
    }

    fn hide_tooltip(&mut self) {
        self.log.lock().expect("log").tooltip = None;
    }

    fn notify(&mut self, message: &str, _ttl: Duration) {
        self.log
            .lock()
            .expect("log")
            .notifications
            .push(message.to_string());
    }

    fn set_controls(&mut self, controls: ControlStates) {
        self.log.lock().expect("log").controls.push(controls);
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Script {
    Reply(String),
    Fail(String),
    Hang,
}

pub(crate) struct ScriptedCapture {
    start_error: Option<String>,
    stop: Script,
    pub aborted: Arc<Mutex<bool>>,
}

impl ScriptedCapture {
    pub fn clip(bytes: &str) -> Self {
        Self {
            start_error: None,
            stop: Script::Reply(bytes.to_string()),
            aborted: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_stop(stop: Script) -> Self {
        Self {
            stop,
            ..Self::clip("")
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            start_error: Some(reason.to_string()),
            ..Self::clip("")
        }
    }
}

#[async_trait]
impl AudioCapture for ScriptedCapture {
    async fn start(&mut self) -> Result<(), CaptureError> {
        match &self.start_error {
            Some(reason) => Err(CaptureError::DeviceUnavailable(reason.clone())),
            None => Ok(()),
        }
    }

    async fn stop(&mut self) -> Result<AudioPayload, CaptureError> {
        match self.stop.clone() {
            Script::Reply(bytes) => Ok(AudioPayload::webm(bytes.into_bytes())),
            Script::Fail(reason) => Err(CaptureError::DeviceUnavailable(reason)),
            Script::Hang => std::future::pending().await,
        }
    }

    async fn abort(&mut self) {
        *self.aborted.lock().expect("aborted") = true;
    }
}

pub(crate) struct ScriptedTranscriber {
    script: Script,
    pub received: Arc<Mutex<Vec<AudioPayload>>>,
}

impl ScriptedTranscriber {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(Script::Reply(text.to_string()))
    }
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, audio: AudioPayload) -> Result<String, TranscriptionError> {
        self.received.lock().expect("received").push(audio);
        match self.script.clone() {
            Script::Reply(text) => Ok(text),
            Script::Fail(message) => Err(TranscriptionError::Service(message)),
            Script::Hang => std::future::pending().await,
        }
    }
}
