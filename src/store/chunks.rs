use crate::error::StorageError;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Reference to stored chunk bytes. The store owns the bytes; this is a
/// handle, not ownership.
#[derive(Debug, Clone)]
pub struct ChunkRef {
    pub sequence: u32,
    pub path: PathBuf,
    pub bytes: u64,
}

/// Result of one directory scan over a session namespace.
#[derive(Debug)]
pub struct SessionSurvey {
    /// Maximal contiguous run `1..=k`, in sequence order
    pub contiguous: Vec<ChunkRef>,
    /// Chunks stored beyond the first gap; present but unusable for assembly
    pub stranded: usize,
}

/// Session ids become directory names, so they must not carry path
/// components. Validated at the HTTP boundary and again before any path is
/// built.
pub fn session_id_is_safe(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id != "."
        && session_id != ".."
        && !session_id.contains(['/', '\\', '\0'])
}

/// Filesystem-backed chunk store. One directory per session, one
/// `<sequence>.webm` file per chunk.
pub struct ChunkStore {
    root: PathBuf,
}

impl ChunkStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.root.join(session_id)
    }

    fn chunk_path(&self, session_id: &str, sequence: u32) -> PathBuf {
        self.session_dir(session_id).join(format!("{sequence}.webm"))
    }

    /// Durably store chunk bytes. Idempotent per `(session, sequence)`:
    /// a repeat call replaces prior bytes (last-write-wins). Safe under
    /// concurrent puts for distinct sequences of the same session.
    pub async fn put(
        &self,
        session_id: &str,
        sequence: u32,
        bytes: &[u8],
    ) -> Result<ChunkRef, StorageError> {
        let dir = self.session_dir(session_id);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::new(&dir, e))?;

        let final_path = self.chunk_path(session_id, sequence);

        // Write to a unique temp name, fsync, then rename into place so a
        // concurrent re-upload of the same sequence can never leave a torn
        // file behind.
        let tmp_path = dir.join(format!("{sequence}.webm.part-{}", uuid::Uuid::new_v4()));
        let write = async {
            let mut file = fs::File::create(&tmp_path).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            fs::rename(&tmp_path, &final_path).await
        };
        if let Err(e) = write.await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::new(&final_path, e));
        }

        debug!(
            session_id,
            sequence,
            bytes = bytes.len(),
            "stored chunk"
        );

        Ok(ChunkRef {
            sequence,
            path: final_path,
            bytes: bytes.len() as u64,
        })
    }

    /// Scan the session namespace once and return the contiguous run starting
    /// at sequence 1, plus a count of chunks stranded beyond the first gap.
    /// A session with no directory at all surveys as empty.
    pub async fn survey(&self, session_id: &str) -> Result<SessionSurvey, StorageError> {
        let dir = self.session_dir(session_id);

        let mut sequences = BTreeSet::new();
        let mut read_dir = match fs::read_dir(&dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SessionSurvey {
                    contiguous: Vec::new(),
                    stranded: 0,
                })
            }
            Err(e) => return Err(StorageError::new(&dir, e)),
        };

        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| StorageError::new(&dir, e))?
        {
            if let Some(seq) = parse_sequence(&entry.path()) {
                sequences.insert(seq);
            }
        }

        let mut contiguous = Vec::new();
        let mut next = 1u32;
        while sequences.contains(&next) {
            let path = self.chunk_path(session_id, next);
            let meta = fs::metadata(&path)
                .await
                .map_err(|e| StorageError::new(&path, e))?;
            contiguous.push(ChunkRef {
                sequence: next,
                path,
                bytes: meta.len(),
            });
            next += 1;
        }

        let stranded = sequences.len() - contiguous.len();

        Ok(SessionSurvey {
            contiguous,
            stranded,
        })
    }

    /// List the session namespaces currently on disk with their
    /// last-modified time. A chunk write bumps the directory mtime, so it
    /// doubles as a last-activity proxy for sessions no tracker knows about.
    pub async fn list_sessions(
        &self,
    ) -> Result<Vec<(String, std::time::SystemTime)>, StorageError> {
        let mut sessions = Vec::new();

        let mut read_dir = match fs::read_dir(&self.root).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(sessions),
            Err(e) => return Err(StorageError::new(&self.root, e)),
        };

        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| StorageError::new(&self.root, e))?
        {
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };
            if !file_type.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            // If the mtime is unavailable, treat the namespace as fresh
            // rather than reclaiming something still in use.
            let modified = entry
                .metadata()
                .await
                .ok()
                .and_then(|m| m.modified().ok())
                .unwrap_or_else(std::time::SystemTime::now);
            sessions.push((name, modified));
        }

        Ok(sessions)
    }

    /// Reclaim the whole per-session namespace. Absence is not an error.
    pub async fn remove_session(&self, session_id: &str) -> Result<(), StorageError> {
        let dir = self.session_dir(session_id);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::new(&dir, e)),
        }
    }
}

/// A chunk file is `<sequence>.webm` with a positive integer stem. Derived
/// artifacts (capture.webm, canonical.wav, temp parts) fail the parse and
/// are ignored.
fn parse_sequence(path: &Path) -> Option<u32> {
    if path.extension()? != "webm" {
        return None;
    }
    let seq: u32 = path.file_stem()?.to_str()?.parse().ok()?;
    (seq >= 1).then_some(seq)
}
