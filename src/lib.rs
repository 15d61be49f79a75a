pub mod collab;
pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod session;
pub mod store;
pub mod transcribe;

pub use config::Config;
pub use error::{AssemblyError, BackendError, PipelineError, StorageError, TranscodeError};
pub use http::{create_router, AppState};
pub use pipeline::{
    Assembler, Assembly, FfmpegTranscoder, Orchestrator, Transcoder, TranscriptResult,
    TranscriptSource,
};
pub use session::{Session, SessionState, SessionTracker};
pub use store::{ChunkRef, ChunkStore, SessionSurvey};
pub use transcribe::{MockBackend, TranscriptionBackend, WhisperBackend};
