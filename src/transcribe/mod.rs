//! Transcription backends
//!
//! Polymorphic over the concrete provider: the real speech-to-text service
//! when a credential is configured, a local mock otherwise. Selection is by
//! capability injection at construction, never by environment lookups inside
//! request handling.

mod backend;
mod mock;
mod whisper;

pub use backend::TranscriptionBackend;
pub use mock::{MockBackend, MOCK_TRANSCRIPT};
pub use whisper::WhisperBackend;

use crate::config::TranscriptionConfig;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Pick the backend variant for this deployment. A missing credential is not
/// an error: the pipeline must always produce some transcript when audio was
/// assembled and transcoded.
pub fn select_backend(cfg: &TranscriptionConfig) -> Result<Arc<dyn TranscriptionBackend>> {
    match cfg.api_key.as_deref() {
        Some(key) if !key.is_empty() => {
            info!(model = %cfg.model, "using real transcription backend");
            Ok(Arc::new(WhisperBackend::new(cfg)?))
        }
        _ => {
            info!("no transcription credential configured; using mock backend");
            Ok(Arc::new(MockBackend))
        }
    }
}
