//! Payload-to-chart reconcilers.
//!
//! Each function updates one chart's label/series data in place from a
//! freshly received payload. Missing values are always treated as
//! zero, never skipped or left undefined.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use stats_common::StatsPayload;

use crate::charts::{BarChart, DonutRow, NamedSeries, TrendChart, DONUT_SLOTS};

/// Trend: labels become the sorted union of all daily keys across all
/// regions; every region reports a value for every label, defaulting
/// to zero. The smoothing parameter is left untouched.
pub fn reconcile_trend(chart: &mut TrendChart, payload: &StatsPayload) {
    let labels: Vec<NaiveDate> = payload
        .regions
        .iter()
        .flat_map(|region| region.daily_incidents.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    chart.series = payload
        .regions
        .iter()
        .map(|region| NamedSeries {
            name: region.macroregion.clone(),
            values: labels
                .iter()
                .map(|date| region.daily_incidents.get(date).copied().unwrap_or(0))
                .collect(),
        })
        .collect();
    chart.labels = labels;
}

/// Bars: labels are the ordered region keys; the two series carry
/// total open incidents and unknown-power-cause counts.
pub fn reconcile_bars(chart: &mut BarChart, payload: &StatsPayload) {
    chart.labels = payload
        .regions
        .iter()
        .map(|region| region.macroregion.clone())
        .collect();

    let open: Vec<u64> = payload
        .regions
        .iter()
        .map(|region| region.total_open_incidents)
        .collect();
    let unknown: Vec<u64> = payload
        .regions
        .iter()
        .map(|region| region.unknown_power_cause_count)
        .collect();

    if let Some(series) = chart.series.get_mut(0) {
        series.values = open;
    }
    if let Some(series) = chart.series.get_mut(1) {
        series.values = unknown;
    }
}

/// Donuts: one slot per region in payload order, extracting the bucket
/// vector for the row's active SLA category. A zero-sum vector flips
/// the slot into the explicit no-data state instead of rendering four
/// empty segments; a single non-zero bucket suppresses segment borders
/// to avoid the full-circle border artifact.
pub fn reconcile_donuts(row: &mut DonutRow, payload: &StatsPayload) {
    for (index, slot) in row.slots.iter_mut().enumerate() {
        let Some(region) = payload.regions.get(index) else {
            slot.region = None;
            slot.values = [0; 4];
            slot.border_width = 0;
            slot.tooltip_enabled = false;
            slot.empty = true;
            continue;
        };

        let values = region.sla(row.category).as_array();
        slot.region = Some(region.macroregion.clone());
        if values.iter().all(|&v| v == 0) {
            slot.values = [0; 4];
            slot.border_width = 0;
            slot.tooltip_enabled = false;
            slot.empty = true;
        } else {
            let non_zero = values.iter().filter(|&&v| v > 0).count();
            slot.values = values;
            slot.border_width = if non_zero == 1 { 0 } else { 1 };
            slot.tooltip_enabled = true;
            slot.empty = false;
        }
    }
    debug_assert_eq!(row.slots.len(), DONUT_SLOTS);
}

#[cfg(test)]
mod tests {
    use super::*;
    use stats_common::{RegionStats, SlaCategory, StatsPayload};

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn payload(regions: Vec<RegionStats>) -> StatsPayload {
        StatsPayload {
            period: None,
            regions,
        }
    }

    #[test]
    fn trend_labels_are_the_sorted_union_and_gaps_read_zero() {
        let mut a = RegionStats::empty("MR-A");
        a.daily_incidents.insert(d("2026-07-02"), 3);
        a.daily_incidents.insert(d("2026-07-04"), 1);
        let mut b = RegionStats::empty("MR-B");
        b.daily_incidents.insert(d("2026-07-01"), 2);
        b.daily_incidents.insert(d("2026-07-02"), 5);

        let mut chart = TrendChart::skeleton(d("2026-07-10"));
        reconcile_trend(&mut chart, &payload(vec![a, b]));

        assert_eq!(
            chart.labels,
            vec![d("2026-07-01"), d("2026-07-02"), d("2026-07-04")]
        );
        assert_eq!(chart.series[0].name, "MR-A");
        assert_eq!(chart.series[0].values, vec![0, 3, 1]);
        assert_eq!(chart.series[1].values, vec![2, 5, 0]);
    }

    #[test]
    fn trend_preserves_smoothing_across_updates() {
        let mut chart = TrendChart::skeleton(d("2026-07-10"));
        chart.smoothing = 0.7;
        reconcile_trend(&mut chart, &payload(vec![RegionStats::empty("MR-A")]));
        assert_eq!(chart.smoothing, 0.7);
    }

    #[test]
    fn bars_extract_fields_per_region() {
        let mut a = RegionStats::empty("MR-A");
        a.total_open_incidents = 5;
        let mut b = RegionStats::empty("MR-B");
        b.total_open_incidents = 2;
        b.unknown_power_cause_count = 4;

        let mut chart = BarChart::skeleton();
        reconcile_bars(&mut chart, &payload(vec![a, b]));

        assert_eq!(chart.labels, vec!["MR-A", "MR-B"]);
        assert_eq!(chart.series[0].values, vec![5, 2]);
        assert_eq!(chart.series[1].values, vec![0, 4]);
    }

    #[test]
    fn all_zero_buckets_switch_the_donut_to_the_empty_state() {
        let region = RegionStats::empty("MR-1");
        for category in SlaCategory::ALL {
            let mut row = DonutRow::skeleton(category);
            reconcile_donuts(&mut row, &payload(vec![region.clone()]));
            let slot = &row.slots[0];
            assert!(slot.empty, "category {category:?}");
            assert!(!slot.tooltip_enabled);
            assert_eq!(slot.region.as_deref(), Some("MR-1"));
        }
    }

    #[test]
    fn single_bucket_suppresses_borders() {
        let mut region = RegionStats::empty("MR-1");
        region.sla_avr.expired = 4;

        let mut row = DonutRow::skeleton(SlaCategory::Avr);
        reconcile_donuts(&mut row, &payload(vec![region.clone()]));
        assert_eq!(row.slots[0].border_width, 0);
        assert!(!row.slots[0].empty);
        assert!(row.slots[0].tooltip_enabled);

        region.sla_avr.in_progress = 1;
        reconcile_donuts(&mut row, &payload(vec![region]));
        assert_eq!(row.slots[0].border_width, 1);
    }

    #[test]
    fn slots_past_the_region_count_fall_back_to_empty() {
        let mut region = RegionStats::empty("MR-1");
        region.sla_dgu.waiting = 2;

        let mut row = DonutRow::skeleton(SlaCategory::Dgu);
        reconcile_donuts(&mut row, &payload(vec![region]));
        assert!(!row.slots[0].empty);
        for slot in &row.slots[1..] {
            assert!(slot.empty);
            assert_eq!(slot.region, None);
        }
    }

    #[test]
    fn donut_category_selects_the_bucket_set() {
        let mut region = RegionStats::empty("MR-1");
        region.sla_rvr.closed_on_time = 7;

        let mut avr_row = DonutRow::skeleton(SlaCategory::Avr);
        reconcile_donuts(&mut avr_row, &payload(vec![region.clone()]));
        assert!(avr_row.slots[0].empty);

        let mut rvr_row = DonutRow::skeleton(SlaCategory::Rvr);
        reconcile_donuts(&mut rvr_row, &payload(vec![region]));
        assert_eq!(rvr_row.slots[0].values, [0, 7, 0, 0]);
    }
}
