//! Placement → record → transcribe cycle for one marker at a time.

use shared::domain::PanoramaIndex;

use crate::error::WorkflowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    AwaitingPlacement,
    Recording,
    Transcribing,
}

/// Which of the note controls a front-end should leave clickable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlStates {
    pub add_enabled: bool,
    /// Recording starts as soon as a marker is placed, so there is never a
    /// separate record click to accept.
    pub rec_enabled: bool,
    pub stop_enabled: bool,
}

pub fn controls_for(state: WorkflowState) -> ControlStates {
    match state {
        WorkflowState::Idle => ControlStates {
            add_enabled: true,
            rec_enabled: false,
            stop_enabled: false,
        },
        WorkflowState::AwaitingPlacement | WorkflowState::Transcribing => ControlStates {
            add_enabled: false,
            rec_enabled: false,
            stop_enabled: false,
        },
        WorkflowState::Recording => ControlStates {
            add_enabled: false,
            rec_enabled: false,
            stop_enabled: true,
        },
    }
}

/// The marker whose note is being recorded or transcribed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMarker {
    pub panorama: PanoramaIndex,
    /// Position of the marker in its panorama's sequence.
    pub slot: usize,
}

#[derive(Debug, Default)]
pub struct Workflow {
    state: WorkflowState,
    pending: Option<PendingMarker>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn pending(&self) -> Option<PendingMarker> {
        self.pending
    }

    pub fn controls(&self) -> ControlStates {
        controls_for(self.state)
    }

    pub fn accepts_placement(&self) -> bool {
        self.state == WorkflowState::AwaitingPlacement
    }

    pub fn begin_placement(&mut self) -> Result<(), WorkflowError> {
        self.expect(WorkflowState::Idle, "begin placement")?;
        self.state = WorkflowState::AwaitingPlacement;
        Ok(())
    }

    pub fn marker_placed(&mut self, marker: PendingMarker) -> Result<(), WorkflowError> {
        self.expect(WorkflowState::AwaitingPlacement, "place marker")?;
        self.pending = Some(marker);
        self.state = WorkflowState::Recording;
        Ok(())
    }

    pub fn recording_stopped(&mut self) -> Result<PendingMarker, WorkflowError> {
        self.expect(WorkflowState::Recording, "stop recording")?;
        let pending = self.pending.ok_or(WorkflowError::NoPendingMarker)?;
        self.state = WorkflowState::Transcribing;
        Ok(pending)
    }

    /// Releases the pending marker once its note has landed.
    pub fn transcription_finished(&mut self) -> Result<PendingMarker, WorkflowError> {
        self.expect(WorkflowState::Transcribing, "finish transcription")?;
        let pending = self.pending.take().ok_or(WorkflowError::NoPendingMarker)?;
        self.state = WorkflowState::Idle;
        Ok(pending)
    }

    /// Drops back to idle from any state, returning the marker that was
    /// still waiting for a note, if any.
    pub fn abandon(&mut self) -> Option<PendingMarker> {
        self.state = WorkflowState::Idle;
        self.pending.take()
    }

    fn expect(&self, state: WorkflowState, action: &'static str) -> Result<(), WorkflowError> {
        if self.state == state {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                action,
                state: self.state,
            })
        }
    }
}
