//! Property tests for the date-range splitter and table normalization.
//!
//! Uses proptest to verify:
//! 1. Coverage: windows start at `start`, end at `end`, and are contiguous
//! 2. Bound: no window is longer than the requested number of years
//! 3. Union: stitching windowed tables yields each date exactly once

use chrono::{Duration, NaiveDate};
use macrolab_core::data::split::{advance_years, split_date_range};
use macrolab_core::domain::{Observation, TimeSeriesTable};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    // 1950-01-01 .. ~2060
    (0i64..40_000).prop_map(|offset| NaiveDate::from_ymd_opt(1950, 1, 1).unwrap() + Duration::days(offset))
}

fn arb_span() -> impl Strategy<Value = (NaiveDate, NaiveDate)> {
    (arb_date(), 1i64..20_000).prop_map(|(start, len)| (start, start + Duration::days(len)))
}

// ── 1. Coverage ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn windows_cover_the_span_contiguously((start, end) in arb_span(), years in 1u32..12) {
        let windows = split_date_range(start, end, years);

        prop_assert!(!windows.is_empty());
        prop_assert_eq!(windows[0].start, start);
        prop_assert_eq!(windows[windows.len() - 1].end, end);
        for pair in windows.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
        }
        for w in &windows {
            prop_assert!(w.start < w.end);
        }
    }

    #[test]
    fn inverted_or_empty_span_yields_nothing(start in arb_date(), back in 0i64..5_000, years in 0u32..12) {
        let end = start - Duration::days(back);
        prop_assert!(split_date_range(start, end, years).is_empty());
    }
}

// ── 2. Bound ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn no_window_exceeds_the_year_span((start, end) in arb_span(), years in 1u32..12) {
        for w in split_date_range(start, end, years) {
            if let Some(limit) = advance_years(w.start, years) {
                prop_assert!(w.end <= limit);
            }
        }
    }

    #[test]
    fn any_year_count_covers_the_span((start, end) in arb_span(), years in any::<u32>()) {
        let windows = split_date_range(start, end, years);
        prop_assert!(!windows.is_empty());
        prop_assert_eq!(windows[0].start, start);
        prop_assert_eq!(windows[windows.len() - 1].end, end);
        for pair in windows.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn zero_years_is_a_single_window((start, end) in arb_span()) {
        let windows = split_date_range(start, end, 0);
        prop_assert_eq!(windows.len(), 1);
        prop_assert_eq!(windows[0].start, start);
        prop_assert_eq!(windows[0].end, end);
    }
}

// ── 3. Union ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn stitched_windows_hold_each_day_once((start, end) in arb_span(), years in 1u32..6) {
        let tables = split_date_range(start, end, years).into_iter().map(|w| {
            let rows = (0..w.days())
                .map(|i| Observation::new(w.start + Duration::days(i), Some(i as f64)))
                .collect();
            TimeSeriesTable::new("x", rows)
        });
        let stitched = TimeSeriesTable::union(tables).unwrap();

        prop_assert_eq!(stitched.len() as i64, (end - start).num_days() + 1);
        let dates: Vec<NaiveDate> = stitched.dates().collect();
        for pair in dates.windows(2) {
            prop_assert_eq!(pair[1] - pair[0], Duration::days(1));
        }
    }
}
