// End-to-end finalize pipeline tests with stub transcoders and backends.
//
// The real transcoder shells out to ffmpeg; these tests swap in stubs at the
// Transcoder seam so the orchestrator's sequencing, error mapping, state
// transitions, and cleanup are verified hermetically.

use anyhow::Result;
use async_trait::async_trait;
use aura_voice::error::{BackendError, PipelineError, TranscodeError};
use aura_voice::pipeline::{validate_canonical_wav, Orchestrator, Transcoder, TranscriptSource};
use aura_voice::session::{SessionState, SessionTracker};
use aura_voice::store::ChunkStore;
use aura_voice::transcribe::{MockBackend, TranscriptionBackend, MOCK_TRANSCRIPT};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Hands the assembled stream straight through as if it were canonical.
struct PassthroughTranscoder;

#[async_trait]
impl Transcoder for PassthroughTranscoder {
    async fn transcode(&self, input: &Path) -> Result<PathBuf, TranscodeError> {
        Ok(input.to_path_buf())
    }
}

struct FailingTranscoder;

#[async_trait]
impl Transcoder for FailingTranscoder {
    async fn transcode(&self, _input: &Path) -> Result<PathBuf, TranscodeError> {
        Err(TranscodeError::Resample("no decodable audio".to_string()))
    }
}

/// Never resolves; stands in for an ffmpeg run that outlives the caller.
struct HangingTranscoder;

#[async_trait]
impl Transcoder for HangingTranscoder {
    async fn transcode(&self, _input: &Path) -> Result<PathBuf, TranscodeError> {
        std::future::pending().await
    }
}

struct FailingBackend;

#[async_trait]
impl TranscriptionBackend for FailingBackend {
    async fn transcribe(&self, _canonical: &Path) -> Result<String, BackendError> {
        Err(BackendError::Status {
            status: 503,
            body: "over capacity".to_string(),
        })
    }

    fn source(&self) -> TranscriptSource {
        TranscriptSource::Backend
    }
}

struct Harness {
    _temp_dir: TempDir,
    store: Arc<ChunkStore>,
    tracker: Arc<SessionTracker>,
    orchestrator: Orchestrator,
}

fn harness(
    transcoder: Arc<dyn Transcoder>,
    backend: Arc<dyn TranscriptionBackend>,
) -> Result<Harness> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(ChunkStore::new(temp_dir.path()));
    let tracker = Arc::new(SessionTracker::new());
    let orchestrator = Orchestrator::new(
        Arc::clone(&store),
        Arc::clone(&tracker),
        transcoder,
        backend,
    );
    Ok(Harness {
        _temp_dir: temp_dir,
        store,
        tracker,
        orchestrator,
    })
}

#[tokio::test]
async fn test_finalize_with_mock_backend_succeeds() -> Result<()> {
    let h = harness(Arc::new(PassthroughTranscoder), Arc::new(MockBackend))?;

    h.store.put("rec-1", 1, b"audio bytes").await?;
    h.tracker.observe("rec-1", 1);

    let result = h.orchestrator.finalize("rec-1").await.expect("finalize");

    assert_eq!(result.session_id, "rec-1");
    assert_eq!(result.source, TranscriptSource::Mock);
    assert_eq!(result.text, MOCK_TRANSCRIPT);

    let session = h.tracker.get("rec-1").expect("session tracked");
    assert_eq!(session.state, SessionState::Complete);

    // Namespace reclaimed after finalize
    assert!(!h.store.session_dir("rec-1").exists());

    Ok(())
}

#[tokio::test]
async fn test_finalize_empty_session_id_is_validation_error() -> Result<()> {
    let h = harness(Arc::new(PassthroughTranscoder), Arc::new(MockBackend))?;

    let err = h.orchestrator.finalize("  ").await.unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));

    // Validation happens before any storage or tracker access
    assert!(h.tracker.get("  ").is_none());

    Ok(())
}

#[tokio::test]
async fn test_finalize_without_chunks_fails_empty_session() -> Result<()> {
    let h = harness(Arc::new(PassthroughTranscoder), Arc::new(MockBackend))?;

    let err = h.orchestrator.finalize("silent").await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Assembly(aura_voice::error::AssemblyError::EmptySession(_))
    ));

    let session = h.tracker.get("silent").expect("failure is inspectable");
    assert_eq!(session.state, SessionState::Failed);
    assert!(session.failure.as_deref().unwrap().contains("no audio"));

    Ok(())
}

#[tokio::test]
async fn test_finalize_uses_partial_run_when_gap_exists() -> Result<()> {
    let h = harness(Arc::new(PassthroughTranscoder), Arc::new(MockBackend))?;

    h.store.put("gappy", 1, b"a").await?;
    h.store.put("gappy", 2, b"b").await?;
    h.store.put("gappy", 4, b"d").await?;

    // The missing chunk 3 must not fail the finalize
    let result = h.orchestrator.finalize("gappy").await.expect("finalize");
    assert_eq!(result.source, TranscriptSource::Mock);

    Ok(())
}

#[tokio::test]
async fn test_transcode_failure_marks_session_failed() -> Result<()> {
    let h = harness(Arc::new(FailingTranscoder), Arc::new(MockBackend))?;

    h.store.put("rec-1", 1, b"audio").await?;

    let err = h.orchestrator.finalize("rec-1").await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Transcode(TranscodeError::Resample(_))
    ));

    let session = h.tracker.get("rec-1").unwrap();
    assert_eq!(session.state, SessionState::Failed);
    assert!(session.failure.as_deref().unwrap().contains("resample"));

    // Failure still reclaims the namespace
    assert!(!h.store.session_dir("rec-1").exists());

    Ok(())
}

#[tokio::test]
async fn test_backend_failure_is_distinct_from_transcode_failure() -> Result<()> {
    let h = harness(Arc::new(PassthroughTranscoder), Arc::new(FailingBackend))?;

    h.store.put("rec-1", 1, b"audio").await?;

    let err = h.orchestrator.finalize("rec-1").await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Backend(BackendError::Status { status: 503, .. })
    ));

    let session = h.tracker.get("rec-1").unwrap();
    assert_eq!(session.state, SessionState::Failed);

    Ok(())
}

#[tokio::test]
async fn test_second_finalize_is_rejected_without_regression() -> Result<()> {
    let h = harness(Arc::new(PassthroughTranscoder), Arc::new(MockBackend))?;

    h.store.put("rec-1", 1, b"audio").await?;
    h.orchestrator.finalize("rec-1").await.expect("finalize");

    let err = h.orchestrator.finalize("rec-1").await.unwrap_err();
    match &err {
        PipelineError::Validation(msg) => {
            // The caller gets plain language, not state-machine internals
            assert!(msg.contains("already been finalized"), "got: {msg}");
            assert!(!msg.contains("transition"), "got: {msg}");
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    // The completed session never moves backwards
    let session = h.tracker.get("rec-1").unwrap();
    assert_eq!(session.state, SessionState::Complete);

    Ok(())
}

#[tokio::test]
async fn test_cancelled_finalize_fails_session_and_reclaims_namespace() -> Result<()> {
    let h = harness(Arc::new(HangingTranscoder), Arc::new(MockBackend))?;

    h.store.put("rec-1", 1, b"audio").await?;

    // Dropping the timed-out finalize future models the caller's request
    // being cancelled mid-pipeline.
    let outcome = tokio::time::timeout(
        std::time::Duration::from_millis(100),
        h.orchestrator.finalize("rec-1"),
    )
    .await;
    assert!(outcome.is_err(), "finalize must still be pending");

    let session = h.tracker.get("rec-1").expect("session tracked");
    assert_eq!(session.state, SessionState::Failed);
    assert!(session.failure.as_deref().unwrap().contains("cancelled"));

    // No phantom in-progress namespace left behind
    assert!(!h.store.session_dir("rec-1").exists());

    Ok(())
}

#[tokio::test]
async fn test_canonical_wav_validation() -> Result<()> {
    let temp_dir = TempDir::new()?;

    // A well-formed WAV with samples passes
    let good = temp_dir.path().join("good.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&good, spec)?;
    for _ in 0..160 {
        writer.write_sample(0i16)?;
    }
    writer.finalize()?;
    validate_canonical_wav(&good).await.expect("valid WAV");

    // Garbage degrades to a resample error, not a panic
    let bad = temp_dir.path().join("bad.wav");
    tokio::fs::write(&bad, b"not a wav at all").await?;
    let err = validate_canonical_wav(&bad).await.unwrap_err();
    assert!(matches!(err, TranscodeError::Resample(_)));

    Ok(())
}
