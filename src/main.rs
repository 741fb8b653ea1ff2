//! ebivis - Main Entry Point
//!
//! Binds the instrument listener and runs the ingestion loop, draining
//! render updates on a separate thread the way a dashboard surface would.

use anyhow::Context;
use ebivis::{config, AppConfig, ChannelSink, IngestServer, RenderUpdate};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,ebivis=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ebivis ingestion core");

    let config = load_config()?;
    config.validate().context("invalid configuration")?;

    let (sink, updates) = ChannelSink::new(64);

    // Stand-in for the dashboard surface: drain snapshots off the ingestion
    // thread. A real renderer would plug in here.
    let drain = std::thread::spawn(move || {
        for update in updates {
            match update {
                RenderUpdate::LineSeries { channel, series } => {
                    tracing::debug!("{} channel: {} series", channel, series.len());
                }
                RenderUpdate::Grid(snapshot) => {
                    tracing::debug!("grid update: {}x{}", snapshot.width, snapshot.height);
                }
                RenderUpdate::Trail(points) => {
                    tracing::debug!("trail update: {} points", points.len());
                }
            }
        }
    });

    let running = Arc::new(AtomicBool::new(true));
    let mut server = IngestServer::new(config, sink, running);
    let result = server.run().context("ingestion loop failed");

    tracing::info!("Shutting down...");
    drop(server);
    let _ = drain.join();

    result
}

/// Load configuration from argv[1] or the platform config directory
fn load_config() -> anyhow::Result<AppConfig> {
    if let Some(path) = std::env::args().nth(1).map(PathBuf::from) {
        return AppConfig::load(&path)
            .with_context(|| format!("failed to load config from {}", path.display()));
    }

    match config::default_config_path() {
        Some(path) if path.exists() => {
            tracing::info!("loading config from {}", path.display());
            Ok(AppConfig::load_or_default(path))
        }
        _ => {
            tracing::info!("no config file found, using defaults");
            Ok(AppConfig::default())
        }
    }
}
