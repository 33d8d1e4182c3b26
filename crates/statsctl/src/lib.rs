//! statsctl - live incident statistics dashboard.
//!
//! Terminal client for the statsd push channel. Owns the chart state,
//! reconciles incoming payloads in place, and renders with ratatui.

pub mod charts;
pub mod cli;
pub mod export;
pub mod orchestrator;
pub mod reconcile;
pub mod theme;
pub mod transport;
pub mod tui;
