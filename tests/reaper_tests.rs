// Tests for stale-session reclamation, including namespaces left on disk
// by a previous process that the in-memory tracker has no entry for.

use anyhow::Result;
use aura_voice::session::{sweep_once, SessionTracker};
use aura_voice::store::ChunkStore;
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test]
async fn test_sweep_reclaims_tracked_stale_session() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = ChunkStore::new(temp_dir.path());
    let tracker = SessionTracker::new();

    store.put("quiet", 1, b"bytes").await?;
    tracker.observe("quiet", 1);

    sweep_once(&tracker, &store, Duration::from_secs(0)).await;

    assert!(tracker.get("quiet").is_none());
    assert!(!store.session_dir("quiet").exists());

    Ok(())
}

#[tokio::test]
async fn test_sweep_reclaims_orphan_left_by_previous_process() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = ChunkStore::new(temp_dir.path());

    store.put("orphan", 1, b"bytes").await?;

    // A restart loses the in-memory tracker but not the on-disk namespace
    let tracker = SessionTracker::new();
    assert!(tracker.get("orphan").is_none());

    sweep_once(&tracker, &store, Duration::from_secs(0)).await;

    assert!(
        !store.session_dir("orphan").exists(),
        "orphaned namespace must age out even without a tracker entry"
    );

    Ok(())
}

#[tokio::test]
async fn test_sweep_keeps_sessions_inside_the_window() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = ChunkStore::new(temp_dir.path());

    // One tracked, one orphaned; both freshly active
    let tracker = SessionTracker::new();
    store.put("tracked", 1, b"a").await?;
    tracker.observe("tracked", 1);
    store.put("orphan", 1, b"b").await?;

    sweep_once(&tracker, &store, Duration::from_secs(3600)).await;

    assert!(tracker.get("tracked").is_some());
    assert!(store.session_dir("tracked").exists());
    assert!(store.session_dir("orphan").exists());

    Ok(())
}

#[tokio::test]
async fn test_sweep_on_missing_storage_root_is_harmless() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path().join("never-created");
    let store = ChunkStore::new(&root);
    let tracker = SessionTracker::new();

    sweep_once(&tracker, &store, Duration::from_secs(0)).await;

    Ok(())
}
