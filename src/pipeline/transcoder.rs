use crate::error::TranscodeError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Normalizes a raw concatenated stream to the canonical encoding the
/// transcription backend accepts: mono, fixed sample rate, no video track.
///
/// A trait seam so the concrete mechanism (external ffmpeg process vs. a
/// linked codec library) is swappable without touching the orchestrator.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Transcode `input` and return the path of the canonical stream.
    /// Pure transformation: no session awareness.
    async fn transcode(&self, input: &Path) -> Result<PathBuf, TranscodeError>;
}

/// Shells out to ffmpeg in two sequential sub-steps: container
/// normalization (remux) first, then resampling to canonical WAV.
pub struct FfmpegTranscoder {
    binary: String,
    sample_rate: u32,
    step_timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(sample_rate: u32, step_timeout: Duration) -> Self {
        Self {
            binary: "ffmpeg".to_string(),
            sample_rate,
            step_timeout,
        }
    }

    /// Run one ffmpeg invocation under the step timeout. The child is
    /// spawned kill-on-drop so an abandoned finalize does not leak it.
    async fn run_step(&self, args: &[&str]) -> Result<std::process::Output, String> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(binary = %self.binary, ?args, "running transcode step");

        match tokio::time::timeout(self.step_timeout, cmd.output()).await {
            Err(_) => Err(format!("timed out after {:?}", self.step_timeout)),
            Ok(Err(e)) => Err(format!("failed to launch {}: {}", self.binary, e)),
            Ok(Ok(output)) => Ok(output),
        }
    }

    /// The original pipeline ignored ffmpeg's exit status outright. Resolved
    /// here as: a nonzero exit is tolerated only when the step still produced
    /// a usable output file; otherwise the step fails with its stderr tail.
    async fn check_step_output(
        step: &str,
        output: std::process::Output,
        produced: &Path,
    ) -> Result<(), String> {
        if output.status.success() {
            return Ok(());
        }

        let usable = tokio::fs::metadata(produced)
            .await
            .map(|m| m.len() > 0)
            .unwrap_or(false);

        if usable {
            warn!(
                step,
                status = ?output.status,
                "transcode step exited nonzero but produced output; proceeding"
            );
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail = stderr.lines().last().unwrap_or("no diagnostic output");
        Err(format!("exit {}: {}", output.status, tail))
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, input: &Path) -> Result<PathBuf, TranscodeError> {
        let workdir = input
            .parent()
            .ok_or_else(|| TranscodeError::Remux("input has no parent directory".to_string()))?;

        // Step 1: remux. Concatenated recorder chunks carry repeated
        // container headers; a copy pass rewrites them into one well-formed
        // stream before resampling.
        let normalized = workdir.join("normalized.webm");
        let input_arg = input.display().to_string();
        let normalized_arg = normalized.display().to_string();
        let output = self
            .run_step(&["-y", "-i", &input_arg, "-c", "copy", &normalized_arg])
            .await
            .map_err(TranscodeError::Remux)?;
        Self::check_step_output("remux", output, &normalized)
            .await
            .map_err(TranscodeError::Remux)?;

        // Step 2: resample to canonical form (mono, fixed rate, no video).
        let canonical = workdir.join("canonical.wav");
        let rate_arg = self.sample_rate.to_string();
        let canonical_arg = canonical.display().to_string();
        let output = self
            .run_step(&[
                "-y",
                "-i",
                &normalized_arg,
                "-ar",
                &rate_arg,
                "-ac",
                "1",
                "-vn",
                &canonical_arg,
            ])
            .await
            .map_err(TranscodeError::Resample)?;
        Self::check_step_output("resample", output, &canonical)
            .await
            .map_err(TranscodeError::Resample)?;

        validate_canonical_wav(&canonical).await?;

        Ok(canonical)
    }
}

/// Confirm the canonical output is actually usable before handing it to the
/// backend: a readable WAV with at least one sample.
pub async fn validate_canonical_wav(path: &Path) -> Result<(), TranscodeError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let reader = hound::WavReader::open(&path)
            .map_err(|e| TranscodeError::Resample(format!("unreadable canonical output: {e}")))?;
        if reader.len() == 0 {
            return Err(TranscodeError::Resample(
                "canonical output contains no samples".to_string(),
            ));
        }
        Ok(())
    })
    .await
    .map_err(|e| TranscodeError::Resample(format!("validation task failed: {e}")))?
}
