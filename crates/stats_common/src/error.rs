//! Error taxonomy for the statistics pipeline.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    /// The filter start date lies after its end date.
    #[error("invalid filter: start date {start} is after end date {end}")]
    InvalidFilter { start: NaiveDate, end: NaiveDate },

    /// A frame arrived that is not valid JSON or does not match any
    /// known envelope shape. Callers log and drop; never fatal.
    #[error("malformed server frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),

    /// Socket or HTTP level failure. Recovered by reconnect/retry.
    #[error("transport error: {0}")]
    Transport(String),
}
