use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use phishguard::analysis::{DecisionEngine, FeedbackStore};
use phishguard::classifier::ClassifierTrio;
use phishguard::config::PhishguardConfig;
use phishguard::http::{AppState, HttpServer};
use phishguard::pipeline::RequestPipeline;
use phishguard::signals::{HeuristicFeatureProvider, PlaceholderPreview};
use phishguard::storage::{DetectionLog, FeedbackFile};

/// URL phishing risk scoring service.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen address
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("phishguard=info,tower_http=info"));
    if args.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .init();
    }

    info!("Starting Phishguard URL Scoring Service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = PhishguardConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }
    info!(bind_addr = %config.server.bind_addr, "Configuration loaded");

    // Persisted state
    let feedback_file = Arc::new(FeedbackFile::new(config.storage.feedback_path.clone()));
    let feedback = Arc::new(FeedbackStore::from_entries(feedback_file.load().await?));
    let detection_log = Arc::new(DetectionLog::open(config.storage.detection_log_path.clone()).await?);

    // Analysis stack
    let engine = Arc::new(DecisionEngine::new(config.engine.clone(), feedback));
    let classifiers = ClassifierTrio::remote(&config.classifiers)?;
    let pipeline = RequestPipeline::new(
        engine,
        Arc::new(HeuristicFeatureProvider::simulated(&config.signals)),
        classifiers,
        Arc::new(PlaceholderPreview::default()),
        detection_log,
    );
    info!("Analysis pipeline initialized");

    let state = AppState::new(pipeline, feedback_file, &config);
    let server = HttpServer::new(config.server.bind_addr, state);

    // Run the server with graceful shutdown on Ctrl+C
    server.serve_with_shutdown(shutdown_signal()).await?;

    info!("Phishguard URL Scoring Service stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
