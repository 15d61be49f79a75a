use crate::collab::{EventPublisher, RuleForwarder};
use crate::pipeline::Orchestrator;
use crate::session::SessionTracker;
use crate::store::ChunkStore;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ChunkStore>,
    pub tracker: Arc<SessionTracker>,
    pub orchestrator: Arc<Orchestrator>,
    pub rules: Arc<RuleForwarder>,
    /// Absent when no pub/sub transport is configured
    pub events: Option<Arc<EventPublisher>>,
}
