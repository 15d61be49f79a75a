use crate::error::AssemblyError;
use crate::store::ChunkStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// The assembled raw stream: a transient artifact inside the session
/// namespace, owned by the orchestrator and removed with it.
#[derive(Debug)]
pub struct Assembly {
    pub path: PathBuf,
    pub chunks_used: usize,
    pub total_bytes: u64,
}

/// Concatenates stored chunks in strict sequence order into one raw stream.
pub struct Assembler {
    store: Arc<ChunkStore>,
}

impl Assembler {
    pub fn new(store: Arc<ChunkStore>) -> Self {
        Self { store }
    }

    /// Assemble the contiguous run `1..=k` into `capture.webm`.
    ///
    /// A gap is not an error: it is the defined end of the usable run.
    /// Chunks beyond the gap stay in the store but are excluded, with a
    /// diagnostic so the truncation is visible. Missing sequence 1 means
    /// there is no usable audio at all.
    pub async fn assemble(&self, session_id: &str) -> Result<Assembly, AssemblyError> {
        let survey = self
            .store
            .survey(session_id)
            .await
            .map_err(|e| AssemblyError::Scan { source: e.source })?;

        if survey.contiguous.is_empty() {
            return Err(AssemblyError::EmptySession(session_id.to_string()));
        }

        if survey.stranded > 0 {
            warn!(
                session_id,
                run_length = survey.contiguous.len(),
                stranded = survey.stranded,
                "gap in chunk sequence; chunks beyond the gap are excluded from assembly"
            );
        }

        let out_path = self.store.session_dir(session_id).join("capture.webm");
        let mut out = fs::File::create(&out_path)
            .await
            .map_err(|source| AssemblyError::Write { source })?;

        let mut total_bytes = 0u64;
        for chunk in &survey.contiguous {
            let bytes = fs::read(&chunk.path)
                .await
                .map_err(|source| AssemblyError::ChunkRead {
                    sequence: chunk.sequence,
                    source,
                })?;
            out.write_all(&bytes)
                .await
                .map_err(|source| AssemblyError::Write { source })?;
            total_bytes += bytes.len() as u64;
        }
        out.flush()
            .await
            .map_err(|source| AssemblyError::Write { source })?;

        info!(
            session_id,
            chunks = survey.contiguous.len(),
            bytes = total_bytes,
            "assembled contiguous run"
        );

        Ok(Assembly {
            path: out_path,
            chunks_used: survey.contiguous.len(),
            total_bytes,
        })
    }
}
