//! Shared types for the incident statistics pipeline.
//!
//! Everything that crosses the wire between the aggregation daemon
//! (statsd) and the dashboard client (statsctl) lives here: incident
//! snapshot records, the per-macroregion statistics payload, the server
//! frame envelope with its normalization, and the date-range filter.

pub mod envelope;
pub mod error;
pub mod filter;
pub mod incident;
pub mod payload;

pub use envelope::{ServerFrame, StatsUpdate, WireRegionRecord};
pub use error::StatsError;
pub use filter::StatsFilter;
pub use incident::IncidentRecord;
pub use payload::{
    RegionStats, ReportingPeriod, SlaBucket, SlaBuckets, SlaCategory, StatsPayload,
};
