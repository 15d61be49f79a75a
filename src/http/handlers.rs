use super::state::AppState;
use crate::collab::{ParseOutcome, TransactionEvent};
use crate::error::PipelineError;
use crate::pipeline::TranscriptSource;
use crate::store::session_id_is_safe;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ChunkAck {
    pub session_id: String,
    pub seq: u32,
}

#[derive(Debug, Deserialize)]
pub struct FinalizeRequest {
    pub session: String,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub session_id: String,
    pub transcript: String,
    pub source: TranscriptSource,
}

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ParseRuleRequest {
    #[serde(default)]
    pub transcript: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

fn validation_error(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
            correlation_id: None,
        }),
    )
        .into_response()
}

/// Internal failures return an opaque indicator plus a correlation id; the
/// full cause is only logged, never exposed to the caller.
fn internal_failure(status: StatusCode, public: &str, detail: &dyn std::fmt::Display) -> Response {
    let correlation_id = uuid::Uuid::new_v4().to_string();
    error!(%correlation_id, "{public}: {detail}");
    (
        status,
        Json(ErrorResponse {
            error: public.to_string(),
            correlation_id: Some(correlation_id),
        }),
    )
        .into_response()
}

fn map_pipeline_error(err: PipelineError) -> Response {
    match &err {
        // Client-correctable: say exactly what is wrong
        PipelineError::Validation(msg) => validation_error(msg.clone()),
        PipelineError::Assembly(crate::error::AssemblyError::EmptySession(_)) => {
            validation_error(err.to_string())
        }
        // Internal: opaque message plus correlation id
        PipelineError::Assembly(_) | PipelineError::Storage(_) => internal_failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "audio processing failed",
            &err,
        ),
        PipelineError::Transcode(_) => internal_failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "audio processing failed",
            &err,
        ),
        PipelineError::Backend(_) => internal_failure(
            StatusCode::BAD_GATEWAY,
            "transcription service unavailable",
            &err,
        ),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /asr/chunk
/// Accept one sequence-numbered audio fragment for a session
pub async fn upload_chunk(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    let mut session_id: Option<String> = None;
    let mut sequence: Option<u32> = None;
    let mut payload: Option<Vec<u8>> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return validation_error(format!("malformed multipart body: {e}")),
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("session") => match field.text().await {
                Ok(text) => session_id = Some(text),
                Err(e) => return validation_error(format!("unreadable session field: {e}")),
            },
            Some("seq") => {
                let text = match field.text().await {
                    Ok(text) => text,
                    Err(e) => return validation_error(format!("unreadable seq field: {e}")),
                };
                match text.trim().parse::<u32>() {
                    Ok(seq) if seq >= 1 => sequence = Some(seq),
                    _ => return validation_error("seq must be a positive integer"),
                }
            }
            Some("chunk") => match field.bytes().await {
                Ok(bytes) => payload = Some(bytes.to_vec()),
                Err(e) => return validation_error(format!("unreadable chunk field: {e}")),
            },
            _ => {}
        }
    }

    let Some(session_id) = session_id.filter(|s| !s.trim().is_empty()) else {
        return validation_error("session is required");
    };
    if !session_id_is_safe(&session_id) {
        return validation_error("session contains invalid characters");
    }
    let Some(sequence) = sequence else {
        return validation_error("seq is required");
    };
    let Some(payload) = payload else {
        return validation_error("chunk is required");
    };

    if let Err(e) = state.store.put(&session_id, sequence, &payload).await {
        return internal_failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to store chunk",
            &e,
        );
    }

    state.tracker.observe(&session_id, sequence);

    info!(%session_id, sequence, bytes = payload.len(), "accepted chunk");

    (
        StatusCode::OK,
        Json(ChunkAck {
            session_id,
            seq: sequence,
        }),
    )
        .into_response()
}

/// POST /asr/complete
/// Finalize a session: assemble, transcode, transcribe
pub async fn finalize_session(
    State(state): State<AppState>,
    Json(req): Json<FinalizeRequest>,
) -> Response {
    match state.orchestrator.finalize(&req.session).await {
        Ok(result) => (
            StatusCode::OK,
            Json(TranscriptResponse {
                session_id: result.session_id,
                transcript: result.text,
                source: result.source,
            }),
        )
            .into_response(),
        Err(e) => map_pipeline_error(e),
    }
}

/// GET /asr/:session_id/status
/// Inspect session lifecycle state, including a preserved failure reason
pub async fn session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.tracker.get(&session_id) {
        Some(session) => (StatusCode::OK, Json(session)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("session {session_id} not found"),
                correlation_id: None,
            }),
        )
            .into_response(),
    }
}

/// POST /tts
/// Canned speech synthesis: returns a data URL carrying a silent WAV
pub async fn synthesize_speech(Json(req): Json<TtsRequest>) -> Response {
    if req.text.trim().is_empty() {
        return validation_error("text is required");
    }

    match canned_wav_data_url() {
        Ok(audio_url) => {
            (StatusCode::OK, Json(serde_json::json!({ "audio_url": audio_url }))).into_response()
        }
        Err(e) => internal_failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "speech synthesis failed",
            &e,
        ),
    }
}

fn canned_wav_data_url() -> anyhow::Result<String> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        // A quarter second of silence
        for _ in 0..2000 {
            writer.write_sample(0i16)?;
        }
        writer.finalize()?;
    }

    let encoded = base64::engine::general_purpose::STANDARD.encode(cursor.into_inner());
    Ok(format!("data:audio/wav;base64,{encoded}"))
}

/// POST /events/transaction
/// Publish a demo transaction event on the pub/sub transport
pub async fn publish_transaction(State(state): State<AppState>) -> Response {
    let Some(publisher) = &state.events else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "event transport not configured".to_string(),
                correlation_id: None,
            }),
        )
            .into_response();
    };

    let event = TransactionEvent {
        id: chrono::Utc::now().timestamp(),
        user_id: "00000000-0000-0000-0000-000000000001".to_string(),
        category: "Salary".to_string(),
        amount: 25000,
    };

    match publisher.publish_transaction(&event).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "published" })),
        )
            .into_response(),
        Err(e) => internal_failure(
            StatusCode::BAD_GATEWAY,
            "failed to publish event",
            &e,
        ),
    }
}

/// POST /parse-and-create-rule
/// Forward a voice command to the rules engine, with NLU fallback
pub async fn parse_and_create_rule(
    State(state): State<AppState>,
    Json(req): Json<ParseRuleRequest>,
) -> Response {
    let transcript = req.transcript.trim();
    if transcript.is_empty() {
        return validation_error("transcript is required");
    }

    match state.rules.parse_and_create(transcript).await {
        Ok(ParseOutcome::Created(body)) => (StatusCode::OK, Json(body)).into_response(),
        Ok(ParseOutcome::NotParsed) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "not_parsed",
                "transcript": transcript,
            })),
        )
            .into_response(),
        Err(e) => internal_failure(
            StatusCode::BAD_GATEWAY,
            "rules collaborator unavailable",
            &e,
        ),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
