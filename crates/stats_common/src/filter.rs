//! Date-range filter shared by the pull endpoint and the push channel.
//!
//! The same JSON shape is sent as a client frame on the WebSocket and
//! as query parameters on the statistics endpoint.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::StatsError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsFilter {
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl StatsFilter {
    pub fn new(start_date: NaiveDate, end_date: Option<NaiveDate>) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    /// Default reporting range: first day of the previous calendar
    /// month, open-ended toward today.
    pub fn default_range(today: NaiveDate) -> Self {
        let first_of_month = today.with_day(1).unwrap_or(today);
        let start_date = first_of_month
            .checked_sub_months(Months::new(1))
            .unwrap_or(first_of_month);
        Self {
            start_date,
            end_date: None,
        }
    }

    /// Rejects ranges where the start lies after the end. An open end
    /// is always valid.
    pub fn validate(&self) -> Result<(), StatsError> {
        match self.end_date {
            Some(end) if self.start_date > end => Err(StatsError::InvalidFilter {
                start: self.start_date,
                end,
            }),
            _ => Ok(()),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && self.end_date.map_or(true, |end| date <= end)
    }

    /// Query-string form for the pull endpoint.
    pub fn to_query(&self) -> String {
        match self.end_date {
            Some(end) => format!("start_date={}&end_date={}", self.start_date, end),
            None => format!("start_date={}", self.start_date),
        }
    }
}
