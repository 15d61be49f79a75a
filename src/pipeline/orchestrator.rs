use super::assembler::Assembler;
use super::transcoder::Transcoder;
use crate::error::PipelineError;
use crate::session::{SessionState, SessionTracker, TrackerError};
use crate::store::{session_id_is_safe, ChunkStore};
use crate::transcribe::TranscriptionBackend;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Where a transcript came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptSource {
    Backend,
    Mock,
}

/// Created once per finalize call, not persisted beyond the response.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptResult {
    pub session_id: String,
    pub text: String,
    pub source: TranscriptSource,
}

/// Drives a finalize call through assembly, transcoding, and the backend in
/// order, owning the transient artifacts and the session's terminal state.
pub struct Orchestrator {
    store: Arc<ChunkStore>,
    tracker: Arc<SessionTracker>,
    assembler: Assembler,
    transcoder: Arc<dyn Transcoder>,
    backend: Arc<dyn TranscriptionBackend>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<ChunkStore>,
        tracker: Arc<SessionTracker>,
        transcoder: Arc<dyn Transcoder>,
        backend: Arc<dyn TranscriptionBackend>,
    ) -> Self {
        let assembler = Assembler::new(Arc::clone(&store));
        Self {
            store,
            tracker,
            assembler,
            transcoder,
            backend,
        }
    }

    /// Run the full finalize pipeline for one session.
    ///
    /// Validation happens before any storage access. On any terminal failure
    /// the session moves to `Failed` with the reason preserved, and the
    /// session namespace is reclaimed whether the pipeline succeeded or not.
    pub async fn finalize(&self, session_id: &str) -> Result<TranscriptResult, PipelineError> {
        if session_id.trim().is_empty() {
            return Err(PipelineError::Validation("session is required".to_string()));
        }
        if !session_id_is_safe(session_id) {
            return Err(PipelineError::Validation(
                "session contains invalid characters".to_string(),
            ));
        }

        // A finalize for a session that never uploaded a chunk still gets a
        // tracked lifecycle, so its EmptySession failure is inspectable.
        self.tracker.register(session_id);
        self.tracker
            .transition(session_id, SessionState::Assembling)
            .map_err(finalize_conflict)?;

        // If the caller's request is cancelled mid-pipeline the guard marks
        // the session Failed and reclaims the namespace instead of leaving a
        // phantom in-progress state.
        let mut guard = CancelGuard {
            tracker: Arc::clone(&self.tracker),
            session_dir: self.store.session_dir(session_id),
            session_id: session_id.to_string(),
            armed: true,
        };

        let outcome = self.run(session_id).await;
        guard.armed = false;

        if let Err(e) = self.store.remove_session(session_id).await {
            warn!(session_id, error = %e, "failed to clean up session namespace");
        }

        match &outcome {
            Ok(result) => {
                if let Err(e) = self.tracker.transition(session_id, SessionState::Complete) {
                    warn!(session_id, error = %e, "could not mark session complete");
                }
                info!(
                    session_id,
                    source = ?result.source,
                    chars = result.text.len(),
                    "finalize complete"
                );
            }
            // A validation failure here can only be a lost transition race
            // with another finalize; the winner owns the session's fate.
            Err(PipelineError::Validation(_)) => {}
            Err(e) => {
                self.tracker.fail(session_id, e.to_string());
            }
        }

        outcome
    }

    async fn run(&self, session_id: &str) -> Result<TranscriptResult, PipelineError> {
        let assembly = self.assembler.assemble(session_id).await?;

        self.tracker
            .transition(session_id, SessionState::Transcoding)
            .map_err(finalize_conflict)?;

        let canonical = self.transcoder.transcode(&assembly.path).await?;

        let text = self.backend.transcribe(&canonical).await?;

        Ok(TranscriptResult {
            session_id: session_id.to_string(),
            text,
            source: self.backend.source(),
        })
    }
}

/// A losing transition means another finalize already claimed this session.
/// The caller sees that in plain terms; the state-machine detail stays in
/// the logs.
fn finalize_conflict(e: TrackerError) -> PipelineError {
    match e {
        TrackerError::InvalidTransition { session, from, to } => {
            warn!(session_id = %session, ?from, ?to, "finalize rejected by session state");
            PipelineError::Validation(format!("session {session} has already been finalized"))
        }
        other => PipelineError::Validation(other.to_string()),
    }
}

struct CancelGuard {
    tracker: Arc<SessionTracker>,
    session_dir: PathBuf,
    session_id: String,
    armed: bool,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!(session_id = %self.session_id, "finalize cancelled before completion");
        self.tracker
            .fail(&self.session_id, "finalize cancelled before completion");
        let _ = std::fs::remove_dir_all(&self.session_dir);
    }
}
