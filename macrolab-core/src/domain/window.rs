//! Inclusive calendar-date windows used to bound upstream requests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Brazilian date format used by the central-bank APIs and the CLI.
pub const BR_DATE_FORMAT: &str = "%d/%m/%Y";

/// An inclusive `[start, end]` span of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Length in days, counting both ends.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", format_br(self.start), format_br(self.end))
    }
}

/// Render a date as `dd/mm/yyyy`.
pub fn format_br(date: NaiveDate) -> String {
    date.format(BR_DATE_FORMAT).to_string()
}

/// Parse a `dd/mm/yyyy` date.
pub fn parse_br(text: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(text.trim(), BR_DATE_FORMAT)
}
