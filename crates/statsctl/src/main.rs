//! statsctl entry point.

use anyhow::{bail, Result};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stats_common::{SlaCategory, StatsFilter, StatsUpdate};
use statsctl::charts::{BarChart, DonutRow, TrendChart};
use statsctl::cli::{Cli, Commands};
use statsctl::export::export_all;
use statsctl::reconcile::{reconcile_bars, reconcile_donuts, reconcile_trend};
use statsctl::theme::{Theme, ThemeBus};
use statsctl::transport::fetch_statistics;
use statsctl::tui;

#[tokio::main]
async fn main() -> Result<()> {
    // The TUI owns the terminal, so logs stay quiet unless asked for.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Dump) => dump(&cli).await,
        None => {
            let theme_bus = ThemeBus::new(Theme::dark());
            tui::run(cli, &theme_bus).await
        }
    }
}

/// One-shot fetch over the polling endpoint, printed as the same
/// tab-separated tables the dashboard exports.
async fn dump(cli: &Cli) -> Result<()> {
    let today = Local::now().date_naive();
    let filter = match cli.start_date {
        Some(start) => StatsFilter::new(start, cli.end_date),
        None => StatsFilter::default_range(today),
    };
    filter.validate()?;

    let client = reqwest::Client::new();
    let payload = match fetch_statistics(&client, &cli.server, &filter).await? {
        StatsUpdate::Payload(payload) => payload,
        StatsUpdate::Error(message) => bail!("server rejected the request: {message}"),
    };

    let mut trend = TrendChart::skeleton(today);
    let mut bars = BarChart::skeleton();
    let mut donuts = DonutRow::skeleton(SlaCategory::Avr);
    reconcile_trend(&mut trend, &payload);
    reconcile_bars(&mut bars, &payload);
    reconcile_donuts(&mut donuts, &payload);

    print!("{}", export_all(&trend, &bars, &donuts));
    Ok(())
}
