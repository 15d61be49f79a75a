use super::backend::TranscriptionBackend;
use crate::config::TranscriptionConfig;
use crate::error::BackendError;
use crate::pipeline::TranscriptSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Real speech-to-text backend: posts the canonical WAV to an
/// OpenAI-compatible transcriptions endpoint with a bearer credential.
pub struct WhisperBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl WhisperBackend {
    pub fn new(cfg: &TranscriptionConfig) -> Result<Self> {
        let timeout = Duration::from_secs(cfg.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build transcription HTTP client")?;

        Ok(Self {
            client,
            api_url: cfg.api_url.clone(),
            api_key: cfg.api_key.clone().unwrap_or_default(),
            model: cfg.model.clone(),
            timeout,
        })
    }
}

#[async_trait]
impl TranscriptionBackend for WhisperBackend {
    async fn transcribe(&self, canonical: &Path) -> Result<String, BackendError> {
        let wav = tokio::fs::read(canonical)
            .await
            .map_err(|e| BackendError::Request(format!("failed to read canonical stream: {e}")))?;

        debug!(bytes = wav.len(), model = %self.model, "sending audio to transcription backend");

        let part = multipart::Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| BackendError::Request(e.to_string()))?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        let request = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send();

        let response = match tokio::time::timeout(self.timeout, request).await {
            Err(_) => return Err(BackendError::Timeout(self.timeout)),
            Ok(Err(e)) if e.is_timeout() => return Err(BackendError::Timeout(self.timeout)),
            Ok(Err(e)) => return Err(BackendError::Request(e.to_string())),
            Ok(Ok(response)) => response,
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }

        let parsed: WhisperResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Request(format!("unparseable response: {e}")))?;

        info!(chars = parsed.text.len(), "transcription backend returned text");

        Ok(parsed.text)
    }

    fn source(&self) -> TranscriptSource {
        TranscriptSource::Backend
    }
}
