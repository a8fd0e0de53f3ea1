use thiserror::Error;

use crate::workflow::{PendingMarker, WorkflowState};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("cannot place a marker along a zero-length or non-finite direction")]
    DegenerateDirection,
    #[error("inset {inset} must be smaller than sphere radius {radius}")]
    InvalidRadius { radius: f32, inset: f32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigatorError {
    #[error("panorama count must be at least 1")]
    EmptyPanoramaSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("`{action}` is not allowed while {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: WorkflowState,
    },
    #[error("no marker is waiting for a transcription")]
    NoPendingMarker,
    #[error("note for slot {} on panorama {} does not belong to the pending marker", .0.slot, .0.panorama)]
    StaleNote(PendingMarker),
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("microphone unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("no recording in progress")]
    NotRecording,
    #[error("audio capture failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("audio capture did not stop within {0:?}")]
    Timeout(std::time::Duration),
}

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("{0}")]
    Service(String),
    #[error("transcription request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("transcription service returned status {status} without a readable body")]
    UnexpectedResponse { status: u16 },
    #[error("invalid transcription endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("transcription timed out after {0:?}")]
    Timeout(std::time::Duration),
}
