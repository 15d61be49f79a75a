use crate::error::BackendError;
use crate::pipeline::TranscriptSource;
use async_trait::async_trait;
use std::path::Path;

/// One transcription provider.
///
/// Takes the canonical audio stream (mono, fixed-rate WAV) and returns text.
/// Implementations own their timeout; a call never blocks unboundedly.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    async fn transcribe(&self, canonical: &Path) -> Result<String, BackendError>;

    /// Which variant produced the text, reported to the caller
    fn source(&self) -> TranscriptSource;
}
