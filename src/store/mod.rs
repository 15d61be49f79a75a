//! Session-scoped chunk storage
//!
//! Each session owns a directory under the storage root holding one file per
//! sequence number plus the derived artifacts produced at finalize time. The
//! store exclusively owns chunk bytes for the lifetime of the session.

mod chunks;

pub use chunks::{session_id_is_safe, ChunkRef, ChunkStore, SessionSurvey};
