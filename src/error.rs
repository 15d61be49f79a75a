//! Error taxonomy for the capture/transcription pipeline.
//!
//! Each stage maps its internal failure to exactly one of these kinds before
//! it crosses a component boundary; nothing else leaks past the Orchestrator.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure writing or reading chunk bytes. The client may retry by
/// re-sending the chunk (puts are idempotent per key).
#[derive(Debug, Error)]
#[error("chunk storage failed at {}: {source}", path.display())]
pub struct StorageError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl StorageError {
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum AssemblyError {
    /// Sequence 1 is missing: there is no usable audio at all.
    #[error("no audio received for session {0}")]
    EmptySession(String),

    #[error("failed to scan session storage: {source}")]
    Scan {
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read chunk {sequence}: {source}")]
    ChunkRead {
        sequence: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write assembled stream: {source}")]
    Write {
        #[source]
        source: std::io::Error,
    },
}

/// Transcoding runs as two sequential sub-steps; each gets its own subtype
/// so failures are diagnosable.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("container normalization failed: {0}")]
    Remux(String),

    #[error("resample to canonical format failed: {0}")]
    Resample(String),
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("transcription request failed: {0}")]
    Request(String),

    #[error("transcription service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transcription timed out after {0:?}")]
    Timeout(Duration),
}

/// The single error type a finalize call can surface.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}
