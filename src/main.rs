use anyhow::{Context, Result};
use aura_voice::collab::{EventPublisher, RuleForwarder};
use aura_voice::pipeline::{FfmpegTranscoder, Orchestrator};
use aura_voice::session::{spawn_reaper, SessionTracker};
use aura_voice::store::ChunkStore;
use aura_voice::{create_router, AppState, Config};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "aura-voice", about = "Chunked voice capture and transcription service")]
struct Cli {
    /// Configuration file (without extension)
    #[arg(long, default_value = "config/aura-voice")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    tokio::fs::create_dir_all(&cfg.storage.root)
        .await
        .with_context(|| format!("failed to create storage root {}", cfg.storage.root))?;

    let store = Arc::new(ChunkStore::new(&cfg.storage.root));
    let tracker = Arc::new(SessionTracker::new());

    let transcoder = Arc::new(FfmpegTranscoder::new(
        cfg.transcription.sample_rate,
        Duration::from_secs(cfg.transcription.transcode_timeout_secs),
    ));
    let backend = aura_voice::transcribe::select_backend(&cfg.transcription)?;

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&store),
        Arc::clone(&tracker),
        transcoder,
        backend,
    ));

    let rules = Arc::new(RuleForwarder::new(&cfg.collaborators)?);

    // The event transport is optional; a missing broker must not keep the
    // capture pipeline from serving.
    let events = match cfg.events.nats_url.as_deref() {
        Some(url) if !url.is_empty() => {
            match EventPublisher::connect(url, cfg.events.topic.clone()).await {
                Ok(publisher) => Some(Arc::new(publisher)),
                Err(e) => {
                    warn!(error = %e, "event transport unavailable; /events/transaction disabled");
                    None
                }
            }
        }
        _ => None,
    };

    spawn_reaper(
        Arc::clone(&tracker),
        Arc::clone(&store),
        Duration::from_secs(cfg.storage.sweep_interval_secs),
        Duration::from_secs(cfg.storage.stale_after_secs),
    );

    let state = AppState {
        store,
        tracker,
        orchestrator,
        rules,
        events,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install shutdown handler");
    }
    info!("shutting down");
}
