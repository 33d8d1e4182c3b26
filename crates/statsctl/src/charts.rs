//! Chart state owned by the dashboard orchestrator.
//!
//! Each chart is created once in skeleton form and mutated in place by
//! its reconciler for the dashboard's lifetime; nothing here is ever
//! recreated on update. The structs are render-library agnostic: the
//! TUI reads them, tests assert on them.

use chrono::NaiveDate;

use stats_common::SlaCategory;

/// Number of per-region donut slots rendered, one macroregion each.
pub const DONUT_SLOTS: usize = 8;

/// Days of placeholder data shown before the first real payload.
pub const SKELETON_DAYS: u64 = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct NamedSeries {
    pub name: String,
    pub values: Vec<u64>,
}

impl NamedSeries {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }
}

/// Daily incident trend, one series per macroregion.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendChart {
    pub labels: Vec<NaiveDate>,
    pub series: Vec<NamedSeries>,
    /// Line smoothing parameter. Configured once, preserved across
    /// reconciliations.
    pub smoothing: f64,
}

impl TrendChart {
    /// Skeleton: a flat zero line over the last few days so the layout
    /// is stable before any data arrives.
    pub fn skeleton(today: NaiveDate) -> Self {
        let labels: Vec<NaiveDate> = (0..SKELETON_DAYS)
            .rev()
            .map(|back| today - chrono::Duration::days(back as i64))
            .collect();
        let placeholder = NamedSeries {
            name: "no data".into(),
            values: vec![0; labels.len()],
        };
        Self {
            labels,
            series: vec![placeholder],
            smoothing: 0.35,
        }
    }
}

/// Per-region bar comparison, one series per numeric field.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub labels: Vec<String>,
    pub series: Vec<NamedSeries>,
}

impl BarChart {
    pub fn skeleton() -> Self {
        Self {
            labels: Vec::new(),
            series: vec![
                NamedSeries::new("Open incidents"),
                NamedSeries::new("No power cause"),
            ],
        }
    }
}

/// One donut chart slot. `values` follow the fixed bucket order
/// expired, closed on time, waiting, in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct DonutChart {
    pub region: Option<String>,
    pub values: [u64; 4],
    pub border_width: u16,
    pub tooltip_enabled: bool,
    /// Explicit no-data state: rendered as a single grey segment.
    pub empty: bool,
}

impl DonutChart {
    pub fn skeleton() -> Self {
        Self {
            region: None,
            values: [0; 4],
            border_width: 0,
            tooltip_enabled: false,
            empty: true,
        }
    }
}

/// Fixed-size row of per-region donuts for one SLA category.
#[derive(Debug, Clone, PartialEq)]
pub struct DonutRow {
    pub category: SlaCategory,
    pub slots: Vec<DonutChart>,
}

impl DonutRow {
    pub fn skeleton(category: SlaCategory) -> Self {
        Self {
            category,
            slots: vec![DonutChart::skeleton(); DONUT_SLOTS],
        }
    }
}
