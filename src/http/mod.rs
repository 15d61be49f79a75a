//! HTTP API server
//!
//! REST surface for the capture pipeline and its collaborators:
//! - POST /asr/chunk - Upload one audio chunk
//! - POST /asr/complete - Finalize a session and get its transcript
//! - GET /asr/:session_id/status - Inspect session lifecycle state
//! - POST /tts - Canned speech synthesis payload
//! - POST /events/transaction - Publish a transaction event
//! - POST /parse-and-create-rule - Forward a voice command to the rules engine
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
