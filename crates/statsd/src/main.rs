//! statsd - incident statistics aggregation daemon.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use statsd::config::StatsdConfig;
use statsd::server::{self, AppState};
use statsd::store::IncidentStore;

#[derive(Parser)]
#[command(name = "statsd")]
#[command(about = "Incident statistics aggregation daemon", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the config file (defaults to /etc/dispatch-stats/statsd.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the incident snapshot path from the config
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = StatsdConfig::load(args.config.as_deref())?;
    if let Some(snapshot) = args.snapshot {
        config.snapshot_path = snapshot;
    }

    info!("statsd v{} starting", env!("CARGO_PKG_VERSION"));

    let store = IncidentStore::load(&config.snapshot_path)?;
    info!("serving statistics for {} incidents", store.len());

    server::run(AppState::new(store, config)).await
}
