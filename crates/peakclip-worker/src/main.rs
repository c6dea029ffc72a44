//! VOD highlight clipping worker binary.
//!
//! Single-shot: ensures/claims one job, processes it, and exits.

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use peakclip_store::JobStoreClient;
use peakclip_storage::ClipBucket;
use peakclip_worker::controller::JobController;
use peakclip_worker::services::{EnergyAnalyzer, FfmpegEncoder, YtDlpFetcher};
use peakclip_worker::transcribe::WhisperTranscriber;
use peakclip_worker::WorkerConfig;

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("peakclip=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting peakclip-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let store = match JobStoreClient::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create job store client: {}", e);
            std::process::exit(1);
        }
    };

    let storage = match ClipBucket::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create storage client: {}", e);
            std::process::exit(1);
        }
    };

    let highlight_config =
        peakclip_media::HighlightConfig::default().with_max_segments(config.max_clips);
    let transcriber = WhisperTranscriber::new(config.whisper_model.clone());

    let controller = JobController::new(
        YtDlpFetcher,
        EnergyAnalyzer::new(highlight_config),
        FfmpegEncoder,
        transcriber,
        storage,
        store,
        config,
    );

    match controller.run_once().await {
        Ok(Some(outcome)) => {
            info!(
                job_id = %outcome.job_id,
                status = %outcome.status,
                clips = outcome.clips,
                "Worker pass complete"
            );
        }
        Ok(None) => {
            info!("Nothing to do");
        }
        Err(e) => {
            error!("Worker error: {}", e);
            std::process::exit(1);
        }
    }
}
