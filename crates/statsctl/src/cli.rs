//! Command-line argument parsing.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Live incident statistics dashboard
#[derive(Parser)]
#[command(name = "statsctl")]
#[command(about = "Live incident statistics dashboard", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Base URL of the statsd server
    #[arg(long, default_value = "http://127.0.0.1:8787")]
    pub server: String,

    /// Use the HTTP polling fallback instead of the WebSocket push
    /// channel
    #[arg(long)]
    pub poll: bool,

    /// Initial reporting range start (defaults to the first day of the
    /// previous month)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Initial reporting range end (open-ended when omitted)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Subcommand (if not provided, starts the dashboard TUI)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch statistics once and print them as tab-separated text
    Dump,
}
