//! Incident snapshot record as stored by the aggregation daemon.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One incident, reduced to the fields the statistics pipeline needs.
///
/// The three optional timestamp pairs correspond to the three SLA
/// categories tracked per incident: contractor repair (AVR), planned
/// restoration (RVR) and generator deployment (DGU).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub id: u64,
    pub macroregion: String,
    pub incident_date: DateTime<Utc>,
    pub is_open: bool,

    /// Whether a power cause has been established for this incident.
    #[serde(default)]
    pub power_cause_resolved: bool,

    /// AVR deadline in minutes, taken from the incident type. Absent
    /// when the type carries no SLA; such incidents fall into no AVR
    /// bucket.
    #[serde(default)]
    pub sla_deadline_minutes: Option<i64>,

    #[serde(default)]
    pub avr_start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub avr_end_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub rvr_start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rvr_end_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub dgu_start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dgu_end_date: Option<DateTime<Utc>>,
}
