//! Configuration for statsd.
//!
//! Loads settings from a TOML file or falls back to defaults. Every
//! field has its own default so partial config files stay valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default config file path.
pub const CONFIG_PATH: &str = "/etc/dispatch-stats/statsd.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsdConfig {
    /// Address the HTTP/WebSocket server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Path to the incident snapshot JSON file.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    /// Push interval for the WebSocket statistics loop, in seconds.
    #[serde(default = "default_push_interval")]
    pub push_interval_secs: u64,

    #[serde(default)]
    pub sla: SlaConfig,
}

/// SLA deadline constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaConfig {
    /// Fixed RVR deadline, hours from RVR start.
    #[serde(default = "default_rvr_deadline_hours")]
    pub rvr_deadline_hours: i64,

    /// DGU counts as in-progress while elapsed time stays under this.
    #[serde(default = "default_dgu_in_progress_hours")]
    pub dgu_in_progress_hours: i64,

    /// DGU counts as expired once elapsed time exceeds this.
    #[serde(default = "default_dgu_waiting_hours")]
    pub dgu_waiting_hours: i64,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("/var/lib/dispatch-stats/incidents.json")
}

fn default_push_interval() -> u64 {
    10
}

fn default_rvr_deadline_hours() -> i64 {
    72
}

fn default_dgu_in_progress_hours() -> i64 {
    12
}

fn default_dgu_waiting_hours() -> i64 {
    // 15 days
    360
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            rvr_deadline_hours: default_rvr_deadline_hours(),
            dgu_in_progress_hours: default_dgu_in_progress_hours(),
            dgu_waiting_hours: default_dgu_waiting_hours(),
        }
    }
}

impl Default for StatsdConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            snapshot_path: default_snapshot_path(),
            push_interval_secs: default_push_interval(),
            sla: SlaConfig::default(),
        }
    }
}

impl StatsdConfig {
    /// Loads config from the given path, or from `CONFIG_PATH`, or
    /// falls back to defaults when no file exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(CONFIG_PATH));
        if !path.exists() {
            warn!("config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: StatsdConfig = toml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: StatsdConfig = toml::from_str("bind_addr = \"0.0.0.0:9000\"").unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.push_interval_secs, 10);
        assert_eq!(config.sla.rvr_deadline_hours, 72);
        assert_eq!(config.sla.dgu_waiting_hours, 360);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = StatsdConfig::load(Some(Path::new("/nonexistent/statsd.toml"))).unwrap();
        assert_eq!(config.bind_addr, default_bind_addr());
    }
}
