//! Date-range fragmentation for long daily downloads.
//!
//! The central-bank time-series API refuses (or times out on) daily requests
//! spanning too many years, so a long span is cut into consecutive windows of
//! at most `span_years` years. Windows share their boundary day
//! (`windows[i].end == windows[i + 1].start`); the union step downstream
//! collapses the duplicate observation.

use crate::domain::DateWindow;
use chrono::{Datelike, Days, NaiveDate};

/// Default window length for daily SGS requests.
pub const DEFAULT_SPAN_YEARS: u32 = 5;

/// Partition `[start, end]` into contiguous windows of at most `span_years`.
///
/// - `start >= end` yields no windows.
/// - `span_years == 0` disables fragmentation: one window `[start, end]`.
/// - Each step adds `span_years` calendar years to the window start. When that
///   date does not exist (Feb 29 into a non-leap year) the step is exactly
///   `365 * span_years` days instead.
/// - A step past chrono's date range ends the window at `end`.
pub fn split_date_range(start: NaiveDate, end: NaiveDate, span_years: u32) -> Vec<DateWindow> {
    if start >= end {
        return Vec::new();
    }
    if span_years == 0 {
        return vec![DateWindow::new(start, end)];
    }

    let mut windows = Vec::new();
    let mut cursor = start;

    while cursor < end {
        let window_end = advance_years(cursor, span_years).map_or(end, |c| c.min(end));
        windows.push(DateWindow::new(cursor, window_end));
        cursor = window_end;
    }

    windows
}

/// `date` plus `years` calendar years, or plus `365 * years` days when the
/// same month/day does not exist in the target year. `None` when the result
/// falls outside the representable range.
pub fn advance_years(date: NaiveDate, years: u32) -> Option<NaiveDate> {
    let target_year = i32::try_from(years)
        .ok()
        .and_then(|y| date.year().checked_add(y))?;
    match date.with_year(target_year) {
        Some(next) => Some(next),
        None => date.checked_add_days(Days::new(365 * u64::from(years))),
    }
}
