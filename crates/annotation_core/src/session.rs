//! One viewing session: the annotation store, the active panorama, the
//! rendered markers and the note workflow, driven by user events.
//!
//! Every method runs on the caller's task. Closing the capture device and
//! the transcription request are split off into a [`NoteJob`] that can run
//! elsewhere while the session keeps handling navigation and hover; the
//! workflow controls keep a second cycle from starting while one is in
//! flight, so the pending marker is always the one placed last.

use std::{sync::Arc, time::Duration};

use glam::{Vec2, Vec3};
use shared::domain::{PanoramaIndex, VisualId};
use tokio::{sync::Mutex, time::timeout};
use tracing::{debug, info, warn};

use crate::{
    capture::{AudioCapture, AudioPayload},
    config::ViewerConfig,
    error::{CaptureError, GeometryError, NavigatorError, TranscriptionError, WorkflowError},
    geometry::placement_position,
    navigator::PanoramaNavigator,
    renderer::MarkerRenderer,
    scene::SceneBackend,
    store::{AnnotationStore, Marker},
    transcription::Transcriber,
    workflow::{PendingMarker, Workflow, WorkflowState},
};

/// What became of a click on the panorama surface.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// No placement was requested; nothing changed.
    Ignored,
    /// The click direction was unusable; still waiting for a placement.
    Rejected(GeometryError),
    /// A marker was stored. `recording` is false when the microphone could
    /// not be opened and the cycle already ended.
    Placed {
        panorama: PanoramaIndex,
        position: Vec3,
        recording: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: WorkflowState,
    pub panorama: PanoramaIndex,
    pub panorama_count: u32,
    pub pending: Option<PendingMarker>,
    pub markers: Vec<Marker>,
    pub total_markers: usize,
}

pub struct AnnotationSession {
    config: ViewerConfig,
    store: AnnotationStore,
    navigator: PanoramaNavigator,
    renderer: MarkerRenderer,
    workflow: Workflow,
    scene: Box<dyn SceneBackend>,
    capture: SharedCapture,
    transcriber: Arc<dyn Transcriber>,
}

type SharedCapture = Arc<Mutex<Box<dyn AudioCapture>>>;

/// Result of a [`NoteJob`], handed back to [`AnnotationSession::finish_stop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandedNote {
    pub pending: PendingMarker,
    pub note: String,
}

/// Closes the recording and transcribes it for one pending marker. Every
/// failure, including either timeout, is folded into the note text.
pub struct NoteJob {
    pending: PendingMarker,
    capture: SharedCapture,
    transcriber: Arc<dyn Transcriber>,
    capture_stop_timeout: Duration,
    transcription_timeout: Duration,
}

impl NoteJob {
    pub fn pending(&self) -> PendingMarker {
        self.pending
    }

    pub async fn run(self) -> LandedNote {
        let stopped = {
            let mut capture = self.capture.lock().await;
            match timeout(self.capture_stop_timeout, capture.stop()).await {
                Ok(result) => result,
                Err(_) => {
                    capture.abort().await;
                    Err(CaptureError::Timeout(self.capture_stop_timeout))
                }
            }
        };

        let note = match stopped {
            Ok(audio) => {
                transcribe_within(self.transcriber, audio, self.transcription_timeout).await
            }
            Err(error) => {
                warn!(%error, "audio capture failed");
                error.to_string()
            }
        };
        LandedNote {
            pending: self.pending,
            note,
        }
    }
}

impl AnnotationSession {
    /// Builds the session and shows the first panorama.
    pub fn new(
        config: ViewerConfig,
        scene: Box<dyn SceneBackend>,
        capture: Box<dyn AudioCapture>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Result<Self, NavigatorError> {
        let navigator =
            PanoramaNavigator::new(config.panorama_count, config.panorama_base_path.clone())?;
        let mut session = Self {
            renderer: MarkerRenderer::new(config.marker_visual_radius),
            store: AnnotationStore::new(),
            workflow: Workflow::new(),
            navigator,
            config,
            scene,
            capture: Arc::new(Mutex::new(capture)),
            transcriber,
        };
        session.show_current_panorama();
        session.push_controls();
        Ok(session)
    }

    pub fn state(&self) -> WorkflowState {
        self.workflow.state()
    }

    pub fn pending(&self) -> Option<PendingMarker> {
        self.workflow.pending()
    }

    pub fn current_panorama(&self) -> PanoramaIndex {
        self.navigator.current()
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn renderer(&self) -> &MarkerRenderer {
        &self.renderer
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let panorama = self.navigator.current();
        SessionSnapshot {
            state: self.workflow.state(),
            panorama,
            panorama_count: self.navigator.count(),
            pending: self.workflow.pending(),
            markers: self.store.markers_for(panorama).to_vec(),
            total_markers: self.store.total(),
        }
    }

    /// "Add note": the next surface click places a marker.
    pub fn begin_placement(&mut self) -> Result<(), WorkflowError> {
        self.workflow.begin_placement()?;
        self.push_controls();
        self.notify("Click on panorama to place a dot");
        Ok(())
    }

    /// Handles an intersection of the pointer ray with the panorama sphere.
    pub async fn surface_clicked(&mut self, point: Vec3) -> ClickOutcome {
        if !self.workflow.accepts_placement() {
            debug!(state = ?self.workflow.state(), "ignoring surface click");
            return ClickOutcome::Ignored;
        }

        let position =
            match placement_position(point, self.config.sky_radius, self.config.marker_inset) {
                Ok(position) => position,
                Err(error) => {
                    warn!(%error, ?point, "rejected marker placement");
                    self.notify(&error.to_string());
                    return ClickOutcome::Rejected(error);
                }
            };

        let panorama = self.navigator.current();
        let pending = PendingMarker {
            panorama,
            slot: self.store.len(panorama),
        };
        if let Err(error) = self.workflow.marker_placed(pending) {
            warn!(%error, "marker placement raced a state change");
            return ClickOutcome::Ignored;
        }

        self.store.add_marker(panorama, Marker::placed(position));
        let placed = &self.store.markers_for(panorama)[pending.slot..];
        self.renderer.draw_all(self.scene.as_mut(), placed);
        self.push_controls();
        info!(panorama = panorama.0, ?position, "marker placed");

        let started = self.capture.lock().await.start().await;
        match started {
            Ok(()) => {
                self.notify("Recording… press Stop to attach the note");
                ClickOutcome::Placed {
                    panorama,
                    position,
                    recording: true,
                }
            }
            Err(error) => {
                warn!(%error, "could not open microphone");
                self.workflow.abandon();
                self.apply_note(pending, error.to_string());
                ClickOutcome::Placed {
                    panorama,
                    position,
                    recording: false,
                }
            }
        }
    }

    /// "Stop": closes the recording, transcribes it and stores the result
    /// (or the failure message) as the pending marker's note, all on the
    /// caller's task.
    pub async fn stop_recording(&mut self) -> Result<String, WorkflowError> {
        let landed = self.begin_stop()?.run().await;
        let note = landed.note.clone();
        self.finish_stop(landed)?;
        Ok(note)
    }

    /// First half of "Stop": moves to Transcribing and returns the work that
    /// produces the note. Pass its result to [`Self::finish_stop`].
    pub fn begin_stop(&mut self) -> Result<NoteJob, WorkflowError> {
        let pending = self.workflow.recording_stopped()?;
        self.push_controls();
        self.notify("Transcribing…");
        Ok(NoteJob {
            pending,
            capture: Arc::clone(&self.capture),
            transcriber: Arc::clone(&self.transcriber),
            capture_stop_timeout: self.config.capture_stop_timeout,
            transcription_timeout: self.config.transcription_timeout,
        })
    }

    /// Stores a landed note on its marker and returns to Idle.
    pub fn finish_stop(&mut self, landed: LandedNote) -> Result<(), WorkflowError> {
        if self.workflow.state() == WorkflowState::Transcribing
            && self.workflow.pending() != Some(landed.pending)
        {
            return Err(WorkflowError::StaleNote(landed.pending));
        }
        let pending = self.workflow.transcription_finished()?;
        self.apply_note(pending, landed.note);
        Ok(())
    }

    /// Abandons an unfinished placement or recording. Returns whether
    /// anything was cancelled.
    pub async fn cancel(&mut self) -> bool {
        match self.workflow.state() {
            WorkflowState::AwaitingPlacement => {
                self.workflow.abandon();
                self.push_controls();
                self.notify("Placement cancelled");
                true
            }
            WorkflowState::Recording => {
                self.capture.lock().await.abort().await;
                if let Some(pending) = self.workflow.abandon() {
                    info!(panorama = pending.panorama.0, "recording discarded");
                }
                self.push_controls();
                self.notify("Recording discarded");
                true
            }
            WorkflowState::Idle | WorkflowState::Transcribing => false,
        }
    }

    /// Cycles to another panorama and redraws its markers.
    pub fn advance(&mut self, offset: i64) -> PanoramaIndex {
        let index = self.navigator.advance(offset);
        self.show_current_panorama();
        self.notify(&format!("Panorama {index}"));
        info!(panorama = index.0, "switched panorama");
        index
    }

    pub fn pointer_enter(&mut self, visual: VisualId) -> Option<Vec2> {
        self.renderer.hover_enter(self.scene.as_mut(), visual)
    }

    pub fn pointer_leave(&mut self, visual: VisualId) {
        self.renderer.hover_leave(self.scene.as_mut(), visual);
    }

    fn apply_note(&mut self, pending: PendingMarker, note: String) {
        debug_assert_eq!(self.store.len(pending.panorama), pending.slot + 1);
        self.store.set_last_marker_text(pending.panorama, note.clone());
        if pending.panorama == self.navigator.current() {
            let markers = self.store.markers_for(pending.panorama);
            self.renderer.redraw(self.scene.as_mut(), markers);
        }
        self.push_controls();
        if !note.is_empty() {
            self.notify(&note);
        }
    }

    fn show_current_panorama(&mut self) {
        let index = self.navigator.current();
        self.scene
            .set_panorama_source(&self.navigator.current_resource());
        self.renderer.clear(self.scene.as_mut());
        self.renderer
            .draw_all(self.scene.as_mut(), self.store.markers_for(index));
    }

    fn push_controls(&mut self) {
        self.scene.set_controls(self.workflow.controls());
    }

    fn notify(&mut self, message: &str) {
        self.scene.notify(message, self.config.notification_ttl);
    }
}

/// Runs the transcription with an upper bound, folding every failure into
/// the message that becomes the marker's note.
async fn transcribe_within(
    transcriber: Arc<dyn Transcriber>,
    audio: AudioPayload,
    limit: Duration,
) -> String {
    match timeout(limit, transcriber.transcribe(audio)).await {
        Ok(Ok(text)) => text,
        Ok(Err(error)) => {
            warn!(%error, "transcription failed");
            error.to_string()
        }
        Err(_) => {
            let error = TranscriptionError::Timeout(limit);
            warn!(%error, "transcription stalled");
            error.to_string()
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
