use super::backend::TranscriptionBackend;
use crate::error::BackendError;
use crate::pipeline::TranscriptSource;
use async_trait::async_trait;
use std::path::Path;

pub const MOCK_TRANSCRIPT: &str = "(mock transcription - no transcription backend configured)";

/// Local stand-in selected when no backend credential is configured.
/// Returns a fixed placeholder immediately and never fails.
pub struct MockBackend;

#[async_trait]
impl TranscriptionBackend for MockBackend {
    async fn transcribe(&self, _canonical: &Path) -> Result<String, BackendError> {
        Ok(MOCK_TRANSCRIPT.to_string())
    }

    fn source(&self) -> TranscriptSource {
        TranscriptSource::Mock
    }
}
