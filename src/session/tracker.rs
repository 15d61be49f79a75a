use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use tracing::info;

/// Lifecycle state of one recording session. States only advance forward;
/// `Failed` is reachable from anywhere and absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Recording,
    Assembling,
    Transcoding,
    Complete,
    Failed,
}

impl SessionState {
    fn rank(self) -> u8 {
        match self {
            SessionState::Recording => 0,
            SessionState::Assembling => 1,
            SessionState::Transcoding => 2,
            SessionState::Complete => 3,
            SessionState::Failed => 4,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub session_id: String,
    pub state: SessionState,
    /// Running maximum sequence observed, not necessarily contiguous
    pub max_sequence: u32,
    pub created_at: DateTime<Utc>,
    pub last_chunk_at: DateTime<Utc>,
    /// Terminal failure reason, preserved for inspection
    pub failure: Option<String>,
}

impl Session {
    fn new(session_id: String) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            state: SessionState::Recording,
            max_sequence: 0,
            created_at: now,
            last_chunk_at: now,
            failure: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("session {0} not found")]
    NotFound(String),

    #[error("session {session}: invalid transition {from:?} -> {to:?}")]
    InvalidTransition {
        session: String,
        from: SessionState,
        to: SessionState,
    },
}

/// In-memory record of session lifecycle state. Sessions are shared-nothing
/// units; the lock is held only for map access, never across awaits.
#[derive(Default)]
pub struct SessionTracker {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the session record if absent. Idempotent.
    pub fn register(&self, session_id: &str) {
        let mut sessions = self.sessions.write().expect("session lock poisoned");
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session::new(session_id.to_string()));
    }

    /// Record chunk arrival: bumps `last_chunk_at` and the running maximum
    /// sequence. Registers the session implicitly on first chunk.
    pub fn observe(&self, session_id: &str, sequence: u32) {
        let mut sessions = self.sessions.write().expect("session lock poisoned");
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session::new(session_id.to_string()));
        session.last_chunk_at = Utc::now();
        session.max_sequence = session.max_sequence.max(sequence);
    }

    /// Advance session state, enforcing the forward-only invariant.
    pub fn transition(&self, session_id: &str, to: SessionState) -> Result<(), TrackerError> {
        let mut sessions = self.sessions.write().expect("session lock poisoned");
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| TrackerError::NotFound(session_id.to_string()))?;

        let from = session.state;
        let allowed = match to {
            // Failed is absorbing: reachable from anywhere, idempotent
            SessionState::Failed => true,
            _ => from != SessionState::Failed && to.rank() > from.rank(),
        };
        if !allowed {
            return Err(TrackerError::InvalidTransition {
                session: session_id.to_string(),
                from,
                to,
            });
        }

        session.state = to;
        Ok(())
    }

    /// Move the session to `Failed`, preserving the reason. Creates the
    /// record if absent so a failed finalize on an unknown id still leaves
    /// an inspectable trace.
    pub fn fail(&self, session_id: &str, reason: impl Into<String>) {
        let mut sessions = self.sessions.write().expect("session lock poisoned");
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session::new(session_id.to_string()));
        session.state = SessionState::Failed;
        session.failure = Some(reason.into());
    }

    pub fn get(&self, session_id: &str) -> Option<Session> {
        let sessions = self.sessions.read().expect("session lock poisoned");
        sessions.get(session_id).cloned()
    }

    /// Remove sessions with no activity inside the window and return their
    /// ids so the caller can reclaim storage.
    pub fn sweep_stale(&self, window: std::time::Duration) -> Vec<String> {
        let cutoff = Utc::now() - Duration::from_std(window).unwrap_or_else(|_| Duration::seconds(3600));

        let mut sessions = self.sessions.write().expect("session lock poisoned");
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.last_chunk_at < cutoff)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            sessions.remove(id);
            info!(session_id = %id, "reclaimed stale session");
        }

        expired
    }
}
