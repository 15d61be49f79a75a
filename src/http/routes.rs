use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Chunked capture pipeline
        .route("/asr/chunk", post(handlers::upload_chunk))
        .route("/asr/complete", post(handlers::finalize_session))
        .route("/asr/:session_id/status", get(handlers::session_status))
        // Collaborator surfaces
        .route("/tts", post(handlers::synthesize_speech))
        .route("/events/transaction", post(handlers::publish_transaction))
        .route(
            "/parse-and-create-rule",
            post(handlers::parse_and_create_rule),
        )
        // Chunks arrive as multipart uploads; allow more than the default 2MB
        .layer(DefaultBodyLimit::max(32 * 1024 * 1024))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
