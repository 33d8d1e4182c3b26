//! Normalized statistics payload: what every downstream consumer sees
//! after the envelope boundary.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One of the four mutually exclusive SLA states of an incident
/// relative to its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlaBucket {
    Expired,
    ClosedOnTime,
    Waiting,
    InProgress,
}

impl SlaBucket {
    pub const ALL: [SlaBucket; 4] = [
        SlaBucket::Expired,
        SlaBucket::ClosedOnTime,
        SlaBucket::Waiting,
        SlaBucket::InProgress,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SlaBucket::Expired => "Expired",
            SlaBucket::ClosedOnTime => "Closed on time",
            SlaBucket::Waiting => "Nearing deadline",
            SlaBucket::InProgress => "In progress",
        }
    }
}

/// SLA category an incident is bucketed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlaCategory {
    /// Contractor repair SLA, deadline per incident type.
    Avr,
    /// Planned restoration SLA, fixed deadline.
    Rvr,
    /// Generator deployment SLA, elapsed-time based.
    Dgu,
}

impl SlaCategory {
    pub const ALL: [SlaCategory; 3] = [SlaCategory::Avr, SlaCategory::Rvr, SlaCategory::Dgu];

    pub fn label(&self) -> &'static str {
        match self {
            SlaCategory::Avr => "AVR",
            SlaCategory::Rvr => "RVR",
            SlaCategory::Dgu => "DGU",
        }
    }

    pub fn next(&self) -> SlaCategory {
        match self {
            SlaCategory::Avr => SlaCategory::Rvr,
            SlaCategory::Rvr => SlaCategory::Dgu,
            SlaCategory::Dgu => SlaCategory::Avr,
        }
    }
}

/// Bucket counts for one SLA category. Canonical field name for the
/// near-deadline bucket is `waiting`; the legacy `less_than_hour`
/// spelling is handled at the wire boundary only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaBuckets {
    pub expired: u64,
    pub closed_on_time: u64,
    pub waiting: u64,
    pub in_progress: u64,
}

impl SlaBuckets {
    pub fn bump(&mut self, bucket: SlaBucket) {
        match bucket {
            SlaBucket::Expired => self.expired += 1,
            SlaBucket::ClosedOnTime => self.closed_on_time += 1,
            SlaBucket::Waiting => self.waiting += 1,
            SlaBucket::InProgress => self.in_progress += 1,
        }
    }

    /// Bucket values in the fixed render order expired, closed on
    /// time, waiting, in progress.
    pub fn as_array(&self) -> [u64; 4] {
        [
            self.expired,
            self.closed_on_time,
            self.waiting,
            self.in_progress,
        ]
    }

    pub fn total(&self) -> u64 {
        self.as_array().iter().sum()
    }
}

/// Aggregated statistics for one macroregion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionStats {
    pub macroregion: String,
    pub total_open_incidents: u64,
    pub total_closed_incidents: u64,
    /// Incidents without an established power cause.
    pub unknown_power_cause_count: u64,
    /// Incident count per day. BTreeMap keeps the keys chronological.
    pub daily_incidents: BTreeMap<NaiveDate, u64>,
    pub sla_avr: SlaBuckets,
    pub sla_rvr: SlaBuckets,
    pub sla_dgu: SlaBuckets,
}

impl RegionStats {
    pub fn empty(macroregion: impl Into<String>) -> Self {
        Self {
            macroregion: macroregion.into(),
            total_open_incidents: 0,
            total_closed_incidents: 0,
            unknown_power_cause_count: 0,
            daily_incidents: BTreeMap::new(),
            sla_avr: SlaBuckets::default(),
            sla_rvr: SlaBuckets::default(),
            sla_dgu: SlaBuckets::default(),
        }
    }

    pub fn sla(&self, category: SlaCategory) -> &SlaBuckets {
        match category {
            SlaCategory::Avr => &self.sla_avr,
            SlaCategory::Rvr => &self.sla_rvr,
            SlaCategory::Dgu => &self.sla_dgu,
        }
    }
}

/// Reporting window a payload was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingPeriod {
    pub from: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
}

/// The normalized aggregate payload. Structural equality doubles as
/// the deduplication signature: the volatile `generated_at` meta field
/// is deliberately not part of this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsPayload {
    /// Absent only for the legacy bare-array envelope shape.
    pub period: Option<ReportingPeriod>,
    pub regions: Vec<RegionStats>,
}
