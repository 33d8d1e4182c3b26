//! Incident snapshot store.
//!
//! The daemon aggregates over a read-only JSON snapshot of incidents
//! exported by the dispatcher application. No writes happen here.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use stats_common::{IncidentRecord, StatsFilter};

#[derive(Debug, Default)]
pub struct IncidentStore {
    records: Vec<IncidentRecord>,
}

impl IncidentStore {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading incident snapshot {}", path.display()))?;
        let records: Vec<IncidentRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing incident snapshot {}", path.display()))?;
        info!(
            "loaded {} incidents from {}",
            records.len(),
            path.display()
        );
        Ok(Self { records })
    }

    pub fn from_records(records: Vec<IncidentRecord>) -> Self {
        Self { records }
    }

    pub fn all(&self) -> &[IncidentRecord] {
        &self.records
    }

    /// Incidents whose date falls inside the filter range.
    pub fn in_range(&self, filter: &StatsFilter) -> Vec<&IncidentRecord> {
        self.records
            .iter()
            .filter(|rec| filter.contains(rec.incident_date.date_naive()))
            .collect()
    }

    /// Incidents within the default reporting range relative to today.
    pub fn last_month(&self, today: chrono::NaiveDate) -> Vec<&IncidentRecord> {
        self.in_range(&StatsFilter::default_range(today))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::io::Write;

    fn record(id: u64, date: &str) -> IncidentRecord {
        let date: NaiveDate = date.parse().unwrap();
        IncidentRecord {
            id,
            macroregion: "MR-1".into(),
            incident_date: Utc
                .from_utc_datetime(&date.and_hms_opt(12, 0, 0).unwrap()),
            is_open: true,
            power_cause_resolved: false,
            sla_deadline_minutes: None,
            avr_start_date: None,
            avr_end_date: None,
            rvr_start_date: None,
            rvr_end_date: None,
            dgu_start_date: None,
            dgu_end_date: None,
        }
    }

    #[test]
    fn in_range_respects_filter_bounds() {
        let store = IncidentStore::from_records(vec![
            record(1, "2026-06-30"),
            record(2, "2026-07-01"),
            record(3, "2026-07-15"),
        ]);
        let filter = StatsFilter::new("2026-07-01".parse().unwrap(), None);
        let hits: Vec<u64> = store.in_range(&filter).iter().map(|r| r.id).collect();
        assert_eq!(hits, vec![2, 3]);
    }

    #[test]
    fn last_month_uses_the_default_range() {
        let store = IncidentStore::from_records(vec![
            record(1, "2026-06-15"),
            record(2, "2026-07-20"),
            record(3, "2026-08-02"),
        ]);
        // Default range from 2026-08-10: starts 2026-07-01, open end.
        let today: NaiveDate = "2026-08-10".parse().unwrap();
        let hits: Vec<u64> = store.last_month(today).iter().map(|r| r.id).collect();
        assert_eq!(hits, vec![2, 3]);
    }

    #[test]
    fn load_reads_snapshot_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let records = vec![record(7, "2026-07-02")];
        write!(file, "{}", serde_json::to_string(&records).unwrap()).unwrap();

        let store = IncidentStore::load(file.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].id, 7);
    }

    #[test]
    fn load_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(IncidentStore::load(file.path()).is_err());
    }
}
