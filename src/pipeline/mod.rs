//! Finalize pipeline
//!
//! Drives a finalize call through assembly, transcoding, and the
//! transcription backend, mapping each stage's failure onto the
//! caller-visible taxonomy.

mod assembler;
mod orchestrator;
mod transcoder;

pub use assembler::{Assembler, Assembly};
pub use orchestrator::{Orchestrator, TranscriptResult, TranscriptSource};
pub use transcoder::{validate_canonical_wav, FfmpegTranscoder, Transcoder};
