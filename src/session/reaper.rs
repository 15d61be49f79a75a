use crate::session::SessionTracker;
use crate::store::ChunkStore;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Background sweep that reclaims sessions with no chunk and no finalize
/// inside the inactivity window, bounding storage growth.
pub fn spawn_reaper(
    tracker: Arc<SessionTracker>,
    store: Arc<ChunkStore>,
    interval: Duration,
    stale_after: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            sweep_once(&tracker, &store, stale_after).await;
        }
    })
}

/// One reclamation pass.
///
/// Tracker-known stale sessions go first. Then the storage root is scanned
/// for namespaces the tracker has no entry for (the tracker is in-memory,
/// so a restart orphans any directories the previous process left behind);
/// those age out by directory mtime.
pub async fn sweep_once(tracker: &SessionTracker, store: &ChunkStore, stale_after: Duration) {
    let expired = tracker.sweep_stale(stale_after);
    if !expired.is_empty() {
        info!(count = expired.len(), "sweeping stale sessions");
    }
    for session_id in expired {
        if let Err(e) = store.remove_session(&session_id).await {
            warn!(%session_id, error = %e, "failed to reclaim session storage");
        }
    }

    let on_disk = match store.list_sessions().await {
        Ok(list) => list,
        Err(e) => {
            warn!(error = %e, "failed to scan storage root for orphaned sessions");
            return;
        }
    };

    let now = SystemTime::now();
    for (session_id, modified) in on_disk {
        if tracker.get(&session_id).is_some() {
            continue;
        }
        let age = now.duration_since(modified).unwrap_or_default();
        if age < stale_after {
            continue;
        }
        info!(%session_id, "reclaiming orphaned session namespace");
        if let Err(e) = store.remove_session(&session_id).await {
            warn!(%session_id, error = %e, "failed to reclaim orphaned namespace");
        }
    }
}
