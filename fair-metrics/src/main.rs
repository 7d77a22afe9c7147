//! fair-metrics - FAIR metric tests service
//!
//! Serves one `POST /tests/{metric}` endpoint per registered metric. Each
//! call resolves the subject's metadata and returns a JSON-LD evaluation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fair_common::config::SettingsResolver;
use tokio::signal;
use tracing::info;

use fair_metrics::{logging, AppState};

#[derive(Parser, Debug)]
#[command(name = "fair-metrics")]
#[command(about = "FAIR metrics tests API for online resources")]
#[command(version)]
struct Args {
    /// Address to listen on, e.g. 0.0.0.0:8000
    #[arg(short, long, env = "FAIR_BIND")]
    bind: Option<String>,

    /// TOML configuration file
    #[arg(short, long, env = "FAIR_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Installed first so config file warnings are visible
    let log_filter = logging::init();

    let settings = SettingsResolver::new()
        .with_bind(args.bind)
        .with_config_path(args.config)
        .resolve();
    log_filter.apply_settings(&settings);

    settings.validate().context("Invalid configuration")?;

    info!("Starting fair-metrics v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Build: {} ({}, {})",
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Public URL: {}", settings.host_url);
    info!("Harvester service: {}", settings.harvester_url);

    let bind = settings.bind.clone();
    let state = AppState::new(settings).context("Failed to initialize HTTP clients")?;
    info!("Registered {} metric tests", state.registry.len());

    let app = fair_metrics::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {bind}"))?;
    info!("Listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
