use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub transcription: TranscriptionConfig,
    pub collaborators: CollaboratorConfig,
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory for per-session chunk namespaces
    pub root: String,

    /// Inactivity window before a session is reclaimed, in seconds
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,

    /// Interval between reaper sweeps, in seconds
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionConfig {
    /// Speech-to-text endpoint (OpenAI-compatible transcriptions API)
    pub api_url: String,

    /// Model identifier sent with each request
    pub model: String,

    /// Bearer credential. Absent or empty selects the mock backend, which is
    /// not an error condition.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Upper bound on one backend call, in seconds
    #[serde(default = "default_backend_timeout_secs")]
    pub timeout_secs: u64,

    /// Canonical sample rate expected by the backend (Whisper: 16kHz)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Upper bound on one external transcode invocation, in seconds
    #[serde(default = "default_transcode_timeout_secs")]
    pub transcode_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollaboratorConfig {
    /// Rules-engine base URL (rule creation is forwarded here)
    pub rules_url: String,

    /// NLU fallback parser base URL
    pub nlu_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    /// NATS server URL; empty disables the transaction event publisher
    #[serde(default)]
    pub nats_url: Option<String>,

    #[serde(default = "default_events_topic")]
    pub topic: String,
}

fn default_stale_after_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_backend_timeout_secs() -> u64 {
    120
}

fn default_transcode_timeout_secs() -> u64 {
    60
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_events_topic() -> String {
    "transaction.posted".to_string()
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("AURA").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
