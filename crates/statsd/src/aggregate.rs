//! Per-macroregion aggregation and SLA bucket classification.
//!
//! Pure functions over the incident snapshot with an explicit `now`,
//! so classification is deterministic under test. The bucketing rules
//! mirror the dispatcher's incident annotations: AVR deadlines come
//! from the incident type in minutes, RVR has a fixed hour deadline,
//! DGU is classified on elapsed time alone.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use stats_common::{
    IncidentRecord, RegionStats, ReportingPeriod, SlaBucket, StatsPayload,
};

use crate::config::SlaConfig;

/// AVR: deadline is `avr_start + sla_deadline_minutes`. Incidents
/// without a start or without a type deadline fall into no bucket.
pub fn bucket_avr(rec: &IncidentRecord, now: DateTime<Utc>) -> Option<SlaBucket> {
    let minutes = rec.sla_deadline_minutes?;
    let start = rec.avr_start_date?;
    let deadline = start + Duration::minutes(minutes);
    classify_deadline(deadline, rec.avr_end_date, now)
}

/// RVR: fixed deadline in hours from RVR start.
pub fn bucket_rvr(
    rec: &IncidentRecord,
    sla: &SlaConfig,
    now: DateTime<Utc>,
) -> Option<SlaBucket> {
    let start = rec.rvr_start_date?;
    let deadline = start + Duration::hours(sla.rvr_deadline_hours);
    classify_deadline(deadline, rec.rvr_end_date, now)
}

/// DGU: classified on elapsed time. Expired applies to open and
/// closed incidents alike once the waiting threshold is exceeded.
pub fn bucket_dgu(
    rec: &IncidentRecord,
    sla: &SlaConfig,
    now: DateTime<Utc>,
) -> Option<SlaBucket> {
    let start = rec.dgu_start_date?;
    let elapsed = rec.dgu_end_date.unwrap_or(now) - start;
    let in_progress_max = Duration::hours(sla.dgu_in_progress_hours);
    let waiting_max = Duration::hours(sla.dgu_waiting_hours);

    if elapsed > waiting_max {
        return Some(SlaBucket::Expired);
    }
    match rec.dgu_end_date {
        Some(_) => Some(SlaBucket::ClosedOnTime),
        None if elapsed < in_progress_max => Some(SlaBucket::InProgress),
        None => Some(SlaBucket::Waiting),
    }
}

/// Shared deadline rule for AVR and RVR: closed late or unclosed past
/// the deadline means expired; unclosed with less than an hour of
/// margin means waiting. Expired is strictly past the deadline and
/// waiting strictly before it, so an open incident at the exact
/// deadline instant lands in no bucket.
fn classify_deadline(
    deadline: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<SlaBucket> {
    match end {
        Some(end) if end > deadline => Some(SlaBucket::Expired),
        Some(_) => Some(SlaBucket::ClosedOnTime),
        None if deadline < now => Some(SlaBucket::Expired),
        None if deadline == now => None,
        None if deadline <= now + Duration::hours(1) => Some(SlaBucket::Waiting),
        None => Some(SlaBucket::InProgress),
    }
}

/// Aggregates the filtered incidents into one payload. Region records
/// come out ordered by macroregion key, so consecutive payloads over
/// unchanged data compare equal.
pub fn aggregate(
    records: &[&IncidentRecord],
    sla: &SlaConfig,
    now: DateTime<Utc>,
    period: ReportingPeriod,
) -> StatsPayload {
    let mut regions: BTreeMap<String, RegionStats> = BTreeMap::new();

    for rec in records {
        let stats = regions
            .entry(rec.macroregion.clone())
            .or_insert_with(|| RegionStats::empty(&rec.macroregion));

        if rec.is_open {
            stats.total_open_incidents += 1;
        } else {
            stats.total_closed_incidents += 1;
        }
        if !rec.power_cause_resolved {
            stats.unknown_power_cause_count += 1;
        }
        *stats
            .daily_incidents
            .entry(rec.incident_date.date_naive())
            .or_insert(0) += 1;

        if let Some(bucket) = bucket_avr(rec, now) {
            stats.sla_avr.bump(bucket);
        }
        if let Some(bucket) = bucket_rvr(rec, sla, now) {
            stats.sla_rvr.bump(bucket);
        }
        if let Some(bucket) = bucket_dgu(rec, sla, now) {
            stats.sla_dgu.bump(bucket);
        }
    }

    StatsPayload {
        period: Some(period),
        regions: regions.into_values().collect(),
    }
}
