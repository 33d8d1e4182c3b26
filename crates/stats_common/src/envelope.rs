//! Wire envelope for server frames, and its normalization.
//!
//! The push channel and the pull endpoint historically emitted two
//! payload shapes (a `period`-wrapped object and a bare region array)
//! plus `{ "error": ... }` frames. All three are parsed here and
//! folded into exactly one downstream shape, `StatsUpdate`, so no
//! duck typing survives past this boundary.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StatsError;
use crate::payload::{RegionStats, ReportingPeriod, SlaBuckets, StatsPayload};

/// One region record as it appears on the wire: SLA buckets flattened
/// into `sla_<category>_<bucket>_count` fields. Every count defaults
/// to zero when omitted, never to null. The legacy
/// `*_less_than_hour_count` spelling is accepted on input and never
/// produced.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct WireRegionRecord {
    pub macroregion: String,
    #[serde(default)]
    pub total_open_incidents: u64,
    #[serde(default)]
    pub total_closed_incidents: u64,
    #[serde(default)]
    pub unknown_power_cause_count: u64,
    #[serde(default)]
    pub daily_incidents: BTreeMap<NaiveDate, u64>,

    #[serde(default)]
    pub sla_avr_expired_count: u64,
    #[serde(default)]
    pub sla_avr_closed_on_time_count: u64,
    #[serde(default, alias = "sla_avr_less_than_hour_count")]
    pub sla_avr_waiting_count: u64,
    #[serde(default)]
    pub sla_avr_in_progress_count: u64,

    #[serde(default)]
    pub sla_rvr_expired_count: u64,
    #[serde(default)]
    pub sla_rvr_closed_on_time_count: u64,
    #[serde(default, alias = "sla_rvr_less_than_hour_count")]
    pub sla_rvr_waiting_count: u64,
    #[serde(default)]
    pub sla_rvr_in_progress_count: u64,

    #[serde(default)]
    pub sla_dgu_expired_count: u64,
    #[serde(default)]
    pub sla_dgu_closed_on_time_count: u64,
    #[serde(default, alias = "sla_dgu_less_than_hour_count")]
    pub sla_dgu_waiting_count: u64,
    #[serde(default)]
    pub sla_dgu_in_progress_count: u64,
}

impl From<WireRegionRecord> for RegionStats {
    fn from(wire: WireRegionRecord) -> Self {
        RegionStats {
            macroregion: wire.macroregion,
            total_open_incidents: wire.total_open_incidents,
            total_closed_incidents: wire.total_closed_incidents,
            unknown_power_cause_count: wire.unknown_power_cause_count,
            daily_incidents: wire.daily_incidents,
            sla_avr: SlaBuckets {
                expired: wire.sla_avr_expired_count,
                closed_on_time: wire.sla_avr_closed_on_time_count,
                waiting: wire.sla_avr_waiting_count,
                in_progress: wire.sla_avr_in_progress_count,
            },
            sla_rvr: SlaBuckets {
                expired: wire.sla_rvr_expired_count,
                closed_on_time: wire.sla_rvr_closed_on_time_count,
                waiting: wire.sla_rvr_waiting_count,
                in_progress: wire.sla_rvr_in_progress_count,
            },
            sla_dgu: SlaBuckets {
                expired: wire.sla_dgu_expired_count,
                closed_on_time: wire.sla_dgu_closed_on_time_count,
                waiting: wire.sla_dgu_waiting_count,
                in_progress: wire.sla_dgu_in_progress_count,
            },
        }
    }
}

impl From<&RegionStats> for WireRegionRecord {
    fn from(stats: &RegionStats) -> Self {
        WireRegionRecord {
            macroregion: stats.macroregion.clone(),
            total_open_incidents: stats.total_open_incidents,
            total_closed_incidents: stats.total_closed_incidents,
            unknown_power_cause_count: stats.unknown_power_cause_count,
            daily_incidents: stats.daily_incidents.clone(),
            sla_avr_expired_count: stats.sla_avr.expired,
            sla_avr_closed_on_time_count: stats.sla_avr.closed_on_time,
            sla_avr_waiting_count: stats.sla_avr.waiting,
            sla_avr_in_progress_count: stats.sla_avr.in_progress,
            sla_rvr_expired_count: stats.sla_rvr.expired,
            sla_rvr_closed_on_time_count: stats.sla_rvr.closed_on_time,
            sla_rvr_waiting_count: stats.sla_rvr.waiting,
            sla_rvr_in_progress_count: stats.sla_rvr.in_progress,
            sla_dgu_expired_count: stats.sla_dgu.expired,
            sla_dgu_closed_on_time_count: stats.sla_dgu.closed_on_time,
            sla_dgu_waiting_count: stats.sla_dgu.waiting,
            sla_dgu_in_progress_count: stats.sla_dgu.in_progress,
        }
    }
}

/// Frame metadata emitted alongside wrapped payloads. `generated_at`
/// changes on every tick and is therefore excluded from the
/// normalized payload, otherwise deduplication would never fire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<ReportingPeriod>,
}

/// The three frame shapes a server may emit.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ServerFrame {
    Error {
        error: String,
    },
    Wrapped {
        period: Vec<WireRegionRecord>,
        #[serde(default)]
        meta: Option<FrameMeta>,
    },
    Flat(Vec<WireRegionRecord>),
}

/// Normalized result of one server frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsUpdate {
    Payload(StatsPayload),
    Error(String),
}

impl ServerFrame {
    /// Parses a text frame and normalizes it in one step. Malformed
    /// input is an error for the caller to log and drop.
    pub fn parse(text: &str) -> Result<StatsUpdate, StatsError> {
        let frame: ServerFrame = serde_json::from_str(text)?;
        Ok(frame.normalize())
    }

    pub fn normalize(self) -> StatsUpdate {
        match self {
            ServerFrame::Error { error } => StatsUpdate::Error(error),
            ServerFrame::Wrapped { period, meta } => {
                let regions = period.into_iter().map(RegionStats::from).collect();
                StatsUpdate::Payload(StatsPayload {
                    period: meta.and_then(|m| m.period),
                    regions,
                })
            }
            ServerFrame::Flat(records) => {
                let regions = records.into_iter().map(RegionStats::from).collect();
                StatsUpdate::Payload(StatsPayload {
                    period: None,
                    regions,
                })
            }
        }
    }
}

/// Server-side frame body for the wrapped shape.
#[derive(Debug, Serialize)]
pub struct WrappedFrame {
    pub period: Vec<WireRegionRecord>,
    pub meta: FrameMeta,
}

impl WrappedFrame {
    pub fn new(payload: &StatsPayload, generated_at: DateTime<Utc>) -> Self {
        WrappedFrame {
            period: payload.regions.iter().map(WireRegionRecord::from).collect(),
            meta: FrameMeta {
                generated_at: Some(generated_at),
                period: payload.period,
            },
        }
    }
}
