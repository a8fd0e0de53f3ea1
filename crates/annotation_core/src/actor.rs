//! Runs an [`AnnotationSession`] on its own task so front-ends living on
//! other threads can feed it events without sharing the session.
//!
//! A stop request hands its [`NoteJob`] to a separate task; the landed note
//! comes back through the same queue, so navigation, hover and snapshots
//! keep being served while the transcription is in flight.

use glam::Vec3;
use shared::domain::VisualId;
use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot},
    task::{JoinError, JoinHandle},
};
use tracing::{debug, warn};

use crate::session::{AnnotationSession, LandedNote, NoteJob, SessionSnapshot};

const COMMAND_QUEUE_DEPTH: usize = 64;

#[derive(Debug)]
pub enum SessionCommand {
    BeginPlacement,
    SurfaceClicked(Vec3),
    StopRecording,
    Cancel,
    Advance(i64),
    PointerEnter(VisualId),
    PointerLeave(VisualId),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    /// Posted by the session's own note task when a transcription finishes.
    TranscriptionLanded(LandedNote),
}

impl SessionCommand {
    fn name(&self) -> &'static str {
        match self {
            SessionCommand::BeginPlacement => "begin_placement",
            SessionCommand::SurfaceClicked(_) => "surface_clicked",
            SessionCommand::StopRecording => "stop_recording",
            SessionCommand::Cancel => "cancel",
            SessionCommand::Advance(_) => "advance",
            SessionCommand::PointerEnter(_) => "pointer_enter",
            SessionCommand::PointerLeave(_) => "pointer_leave",
            SessionCommand::Snapshot(_) => "snapshot",
            SessionCommand::TranscriptionLanded(_) => "transcription_landed",
        }
    }
}

#[derive(Debug, Error)]
#[error("annotation session has shut down")]
pub struct SessionClosed;

pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
    task: JoinHandle<AnnotationSession>,
}

/// Moves `session` onto a tokio task that applies commands strictly in the
/// order they were sent.
pub fn spawn_session(session: AnnotationSession) -> SessionHandle {
    let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    let task = tokio::spawn(run(session, rx, tx.downgrade()));
    SessionHandle { tx, task }
}

async fn run(
    mut session: AnnotationSession,
    mut rx: mpsc::Receiver<SessionCommand>,
    loopback: mpsc::WeakSender<SessionCommand>,
) -> AnnotationSession {
    while let Some(cmd) = rx.recv().await {
        debug!(command = cmd.name(), "session command");
        match cmd {
            SessionCommand::BeginPlacement => {
                if let Err(error) = session.begin_placement() {
                    warn!(%error, "begin placement refused");
                }
            }
            SessionCommand::SurfaceClicked(point) => {
                session.surface_clicked(point).await;
            }
            SessionCommand::StopRecording => match session.begin_stop() {
                Ok(job) => match loopback.upgrade() {
                    Some(tx) => spawn_note_job(job, tx),
                    // Every handle is gone; finish inline so the queue drains.
                    None => {
                        let landed = job.run().await;
                        land(&mut session, landed);
                    }
                },
                Err(error) => warn!(%error, "stop refused"),
            },
            SessionCommand::TranscriptionLanded(landed) => land(&mut session, landed),
            SessionCommand::Cancel => {
                session.cancel().await;
            }
            SessionCommand::Advance(offset) => {
                session.advance(offset);
            }
            SessionCommand::PointerEnter(visual) => {
                session.pointer_enter(visual);
            }
            SessionCommand::PointerLeave(visual) => session.pointer_leave(visual),
            SessionCommand::Snapshot(reply) => {
                let _ = reply.send(session.snapshot());
            }
        }
    }
    session
}

/// Runs `job` on its own task. The task keeps a sender alive until the note
/// is posted, so a shutdown waits for in-flight transcriptions.
fn spawn_note_job(job: NoteJob, tx: mpsc::Sender<SessionCommand>) {
    let pending = job.pending();
    debug!(panorama = pending.panorama.0, slot = pending.slot, "note job started");
    tokio::spawn(async move {
        let landed = job.run().await;
        if tx
            .send(SessionCommand::TranscriptionLanded(landed))
            .await
            .is_err()
        {
            warn!(panorama = pending.panorama.0, "session gone before note landed");
        }
    });
}

fn land(session: &mut AnnotationSession, landed: LandedNote) {
    if let Err(error) = session.finish_stop(landed) {
        warn!(%error, "landed note rejected");
    }
}

impl SessionHandle {
    pub async fn send(&self, cmd: SessionCommand) -> Result<(), SessionClosed> {
        self.tx.send(cmd).await.map_err(|_| SessionClosed)
    }

    /// Waits until every earlier command has been applied, then reports the
    /// session state.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot(reply)).await?;
        rx.await.map_err(|_| SessionClosed)
    }

    /// Drains the queue and hands the session back.
    pub async fn shutdown(self) -> Result<AnnotationSession, JoinError> {
        drop(self.tx);
        self.task.await
    }
}
