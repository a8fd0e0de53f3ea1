use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use annotation_core::{
    error::{CaptureError, TranscriptionError},
    spawn_session, AnnotationSession, AudioCapture, AudioPayload, Camera, ControlStates,
    MarkerVisual, SceneBackend, SessionCommand, SessionHandle, SessionSnapshot, Transcriber,
    Viewport, ViewerConfig, WorkflowState,
};
use async_trait::async_trait;
use glam::{Mat4, Vec2, Vec3};
use shared::domain::{PanoramaIndex, VisualId};

struct NullScene {
    next_id: Arc<AtomicU64>,
}

impl SceneBackend for NullScene {
    fn set_panorama_source(&mut self, _resource: &str) {}

    fn create_marker_visual(&mut self, _visual: MarkerVisual) -> VisualId {
        VisualId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn remove_marker_visual(&mut self, _id: VisualId) {}

    fn camera_transform(&self) -> Mat4 {
        Camera::panorama(0.0, 0.0, 16.0 / 9.0).view_projection()
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(1600.0, 900.0)
    }

    fn show_tooltip(&mut self, _at: Vec2, _text: &str) {}

    fn hide_tooltip(&mut self) {}

    fn notify(&mut self, _message: &str, _ttl: Duration) {}

    fn set_controls(&mut self, _controls: ControlStates) {}
}

struct ClipCapture;

#[async_trait]
impl AudioCapture for ClipCapture {
    async fn start(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    async fn stop(&mut self) -> Result<AudioPayload, CaptureError> {
        Ok(AudioPayload::webm(b"clip".to_vec()))
    }

    async fn abort(&mut self) {}
}

/// Replies with the given outcomes in order.
struct QueuedTranscriber {
    replies: std::sync::Mutex<Vec<Result<String, String>>>,
}

#[async_trait]
impl Transcriber for QueuedTranscriber {
    async fn transcribe(&self, _audio: AudioPayload) -> Result<String, TranscriptionError> {
        let next = self.replies.lock().expect("replies").remove(0);
        tokio::time::sleep(Duration::from_millis(5)).await;
        next.map_err(TranscriptionError::Service)
    }
}

/// Answers every request after `delay`.
struct SlowTranscriber {
    delay: Duration,
    text: &'static str,
}

#[async_trait]
impl Transcriber for SlowTranscriber {
    async fn transcribe(&self, _audio: AudioPayload) -> Result<String, TranscriptionError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.text.to_string())
    }
}

fn session_with(transcriber: Arc<dyn Transcriber>) -> AnnotationSession {
    AnnotationSession::new(
        ViewerConfig::default(),
        Box::new(NullScene {
            next_id: Arc::new(AtomicU64::new(1)),
        }),
        Box::new(ClipCapture),
        transcriber,
    )
    .expect("session")
}

fn session(replies: Vec<Result<String, String>>) -> AnnotationSession {
    session_with(Arc::new(QueuedTranscriber {
        replies: std::sync::Mutex::new(replies),
    }))
}

async fn wait_until_idle(handle: &SessionHandle) -> SessionSnapshot {
    for _ in 0..200 {
        let snapshot = handle.snapshot().await.expect("snapshot");
        if snapshot.state == WorkflowState::Idle {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session never returned to idle");
}

async fn send_all(handle: &SessionHandle, cmds: Vec<SessionCommand>) {
    for cmd in cmds {
        handle.send(cmd).await.expect("send");
    }
}

#[tokio::test]
async fn queued_commands_apply_in_order() {
    let handle = spawn_session(session(vec![
        Ok("hello".into()),
        Err("network down".into()),
    ]));

    send_all(
        &handle,
        vec![
            SessionCommand::SurfaceClicked(Vec3::X),
            SessionCommand::BeginPlacement,
            SessionCommand::SurfaceClicked(Vec3::new(1.0, 2.0, -3.0)),
            SessionCommand::StopRecording,
        ],
    )
    .await;
    wait_until_idle(&handle).await;

    send_all(
        &handle,
        vec![
            SessionCommand::Advance(1),
            SessionCommand::BeginPlacement,
            SessionCommand::SurfaceClicked(Vec3::NEG_Z),
            SessionCommand::StopRecording,
        ],
    )
    .await;
    let snapshot = wait_until_idle(&handle).await;

    assert_eq!(snapshot.panorama, PanoramaIndex(2));
    assert_eq!(snapshot.panorama_count, 3);
    assert_eq!(snapshot.pending, None);
    assert_eq!(snapshot.markers.len(), 1);
    assert_eq!(snapshot.markers[0].text, "network down");
    assert_eq!(snapshot.total_markers, 2);

    let session = handle.shutdown().await.expect("join");
    let first = session.store().markers_for(PanoramaIndex(1));
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].text, "hello");
    assert!((first[0].position.length() - 49.9).abs() < 1e-3);
}

#[tokio::test]
async fn navigation_is_served_while_a_transcription_is_in_flight() {
    let handle = spawn_session(session_with(Arc::new(SlowTranscriber {
        delay: Duration::from_millis(1500),
        text: "slow note",
    })));

    send_all(
        &handle,
        vec![
            SessionCommand::BeginPlacement,
            SessionCommand::SurfaceClicked(Vec3::NEG_Z),
            SessionCommand::StopRecording,
            SessionCommand::Advance(1),
        ],
    )
    .await;

    let snapshot = tokio::time::timeout(Duration::from_millis(500), handle.snapshot())
        .await
        .expect("snapshot answered while transcribing")
        .expect("snapshot");
    assert_eq!(snapshot.state, WorkflowState::Transcribing);
    assert_eq!(snapshot.panorama, PanoramaIndex(2));
    assert!(snapshot.markers.is_empty());

    let snapshot = wait_until_idle(&handle).await;
    assert_eq!(snapshot.panorama, PanoramaIndex(2));
    assert_eq!(snapshot.total_markers, 1);

    let session = handle.shutdown().await.expect("join");
    assert_eq!(
        session.store().markers_for(PanoramaIndex(1))[0].text,
        "slow note"
    );
}

#[tokio::test]
async fn shutdown_waits_for_the_note_in_flight() {
    let handle = spawn_session(session_with(Arc::new(SlowTranscriber {
        delay: Duration::from_millis(100),
        text: "late but kept",
    })));

    send_all(
        &handle,
        vec![
            SessionCommand::BeginPlacement,
            SessionCommand::SurfaceClicked(Vec3::X),
            SessionCommand::StopRecording,
        ],
    )
    .await;

    let session = handle.shutdown().await.expect("join");
    assert_eq!(session.state(), WorkflowState::Idle);
    assert_eq!(
        session.store().markers_for(PanoramaIndex(1))[0].text,
        "late but kept"
    );
}

#[tokio::test]
async fn a_second_cycle_is_refused_until_the_note_lands() {
    let handle = spawn_session(session_with(Arc::new(SlowTranscriber {
        delay: Duration::from_millis(200),
        text: "first",
    })));

    send_all(
        &handle,
        vec![
            SessionCommand::BeginPlacement,
            SessionCommand::SurfaceClicked(Vec3::X),
            SessionCommand::StopRecording,
            SessionCommand::BeginPlacement,
            SessionCommand::SurfaceClicked(Vec3::Y),
        ],
    )
    .await;

    let snapshot = wait_until_idle(&handle).await;
    assert_eq!(snapshot.total_markers, 1);
    assert_eq!(snapshot.markers[0].text, "first");
}

#[tokio::test]
async fn refused_commands_do_not_stop_the_actor() {
    let handle = spawn_session(session(Vec::new()));

    handle
        .send(SessionCommand::StopRecording)
        .await
        .expect("send");
    handle.send(SessionCommand::Cancel).await.expect("send");
    handle
        .send(SessionCommand::PointerEnter(VisualId(42)))
        .await
        .expect("send");

    let snapshot = handle.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.state, WorkflowState::Idle);
    assert_eq!(snapshot.total_markers, 0);
}
