//! Session lifecycle management
//!
//! The tracker is the single source of truth for session state; no other
//! component mutates lifecycle directly. The reaper reclaims sessions that
//! go quiet without a finalize.

mod reaper;
mod tracker;

pub use reaper::{spawn_reaper, sweep_once};
pub use tracker::{Session, SessionState, SessionTracker, TrackerError};
