//! Spatial annotation of 360° panoramas: marker placement on the sky
//! sphere, per-panorama note storage, hover projection and the
//! place → record → transcribe workflow.

pub mod actor;
pub mod capture;
pub mod config;
pub mod error;
pub mod geometry;
pub mod navigator;
pub mod renderer;
pub mod scene;
pub mod session;
pub mod store;
pub mod transcription;
pub mod workflow;

pub use actor::{spawn_session, SessionClosed, SessionCommand, SessionHandle};
pub use capture::{AudioCapture, AudioPayload, FileCapture};
pub use config::ViewerConfig;
pub use geometry::{placement_position, screen_position, Camera, Viewport};
pub use navigator::PanoramaNavigator;
pub use renderer::MarkerRenderer;
pub use scene::{MarkerVisual, SceneBackend};
pub use session::{AnnotationSession, ClickOutcome, LandedNote, NoteJob, SessionSnapshot};
pub use store::{AnnotationStore, Marker};
pub use transcription::{HttpTranscriber, Transcriber};
pub use workflow::{controls_for, ControlStates, PendingMarker, Workflow, WorkflowState};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
