//! Tab-separated export of chart state, suitable for clipboard paste
//! into a spreadsheet.

use stats_common::SlaBucket;

use crate::charts::{BarChart, DonutRow, TrendChart};

/// First column is the date axis, one column per region series.
pub fn export_trend(chart: &TrendChart) -> String {
    let mut out = String::from("Date");
    for series in &chart.series {
        out.push('\t');
        out.push_str(&series.name);
    }
    out.push('\n');

    for (row, label) in chart.labels.iter().enumerate() {
        out.push_str(&label.to_string());
        for series in &chart.series {
            out.push('\t');
            out.push_str(&series.values.get(row).copied().unwrap_or(0).to_string());
        }
        out.push('\n');
    }
    out
}

/// First column is the region axis, one column per numeric series.
pub fn export_bars(chart: &BarChart) -> String {
    let mut out = String::from("Macroregion");
    for series in &chart.series {
        out.push('\t');
        out.push_str(&series.name);
    }
    out.push('\n');

    for (row, label) in chart.labels.iter().enumerate() {
        out.push_str(label);
        for series in &chart.series {
            out.push('\t');
            out.push_str(&series.values.get(row).copied().unwrap_or(0).to_string());
        }
        out.push('\n');
    }
    out
}

/// The donut row pivots: bucket categories as rows, regions as
/// columns. Empty slots are skipped entirely.
pub fn export_donuts(row: &DonutRow) -> String {
    let occupied: Vec<_> = row
        .slots
        .iter()
        .filter(|slot| slot.region.is_some())
        .collect();

    let mut out = format!("{} SLA", row.category.label());
    for slot in &occupied {
        out.push('\t');
        out.push_str(slot.region.as_deref().unwrap_or(""));
    }
    out.push('\n');

    for (index, bucket) in SlaBucket::ALL.iter().enumerate() {
        out.push_str(bucket.label());
        for slot in &occupied {
            out.push('\t');
            out.push_str(&slot.values[index].to_string());
        }
        out.push('\n');
    }
    out
}

/// All charts in one block, separated by blank lines.
pub fn export_all(trend: &TrendChart, bars: &BarChart, donuts: &DonutRow) -> String {
    format!(
        "{}\n{}\n{}",
        export_trend(trend),
        export_bars(bars),
        export_donuts(donuts)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::NamedSeries;
    use crate::reconcile::reconcile_donuts;
    use stats_common::{RegionStats, SlaCategory, StatsPayload};

    #[test]
    fn trend_export_has_one_row_per_date() {
        let chart = TrendChart {
            labels: vec!["2026-07-01".parse().unwrap(), "2026-07-02".parse().unwrap()],
            series: vec![
                NamedSeries {
                    name: "MR-A".into(),
                    values: vec![1, 2],
                },
                NamedSeries {
                    name: "MR-B".into(),
                    values: vec![0, 5],
                },
            ],
            smoothing: 0.35,
        };

        let text = export_trend(&chart);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Date\tMR-A\tMR-B");
        assert_eq!(lines[1], "2026-07-01\t1\t0");
        assert_eq!(lines[2], "2026-07-02\t2\t5");
    }

    #[test]
    fn donut_export_pivots_buckets_as_rows() {
        let mut mr1 = RegionStats::empty("MR-1");
        mr1.sla_avr.expired = 2;
        mr1.sla_avr.in_progress = 3;
        let mut mr2 = RegionStats::empty("MR-2");
        mr2.sla_avr.closed_on_time = 1;

        let mut row = DonutRow::skeleton(SlaCategory::Avr);
        reconcile_donuts(
            &mut row,
            &StatsPayload {
                period: None,
                regions: vec![mr1, mr2],
            },
        );

        let text = export_donuts(&row);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "AVR SLA\tMR-1\tMR-2");
        assert_eq!(lines[1], "Expired\t2\t0");
        assert_eq!(lines[2], "Closed on time\t0\t1");
        assert_eq!(lines[3], "Nearing deadline\t0\t0");
        assert_eq!(lines[4], "In progress\t3\t0");
    }
}
