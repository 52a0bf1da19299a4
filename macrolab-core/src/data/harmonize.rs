//! Frequency harmonization: one wide frame per bucket.
//!
//! Every table in a bucket is snapped to the bucket's period start and the
//! tables are outer-joined on the union of their dates. Cells a series has no
//! observation for stay `None`; nothing is forward-filled.

use crate::domain::{Frequency, TimeSeriesTable};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// A harmonized bucket: sorted unique dates and one aligned column per series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideFrame {
    pub frequency: Frequency,
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<(String, Vec<Option<f64>>)>,
}

impl WideFrame {
    pub fn empty(frequency: Frequency) -> Self {
        Self {
            frequency,
            dates: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn height(&self) -> usize {
        self.dates.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Value of `name` on `date`; `None` when either is absent or the cell is missing.
    pub fn value(&self, name: &str, date: NaiveDate) -> Option<f64> {
        let row = self.dates.binary_search(&date).ok()?;
        self.column(name)?.get(row).copied().flatten()
    }
}

/// Harmonize every bucket. Observations before `min_date` are dropped.
pub fn harmonize(
    buckets: &BTreeMap<Frequency, Vec<TimeSeriesTable>>,
    min_date: NaiveDate,
) -> BTreeMap<Frequency, WideFrame> {
    buckets
        .iter()
        .map(|(frequency, tables)| (*frequency, harmonize_bucket(*frequency, tables, min_date)))
        .collect()
}

/// Harmonize one bucket.
pub fn harmonize_bucket(
    frequency: Frequency,
    tables: &[TimeSeriesTable],
    min_date: NaiveDate,
) -> WideFrame {
    // Same-name tables are stitched on the time axis, in bucket order.
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<TimeSeriesTable>> = HashMap::new();
    for table in tables {
        let group = groups.entry(table.name()).or_default();
        if group.is_empty() {
            order.push(table.name());
        }
        group.push(table.clone());
    }

    let mut series: Vec<(String, BTreeMap<NaiveDate, Option<f64>>)> = Vec::new();
    for name in order {
        let Some(table) = groups.remove(name).and_then(TimeSeriesTable::union) else {
            continue;
        };
        series.extend(period_columns(frequency, &table, min_date));
    }

    let dates: Vec<NaiveDate> = series
        .iter()
        .flat_map(|(_, values)| values.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let columns = series
        .into_iter()
        .map(|(name, values)| {
            let aligned = dates
                .iter()
                .map(|d| values.get(d).copied().flatten())
                .collect();
            (name, aligned)
        })
        .collect::<Vec<_>>();

    debug!(
        frequency = %frequency,
        rows = dates.len(),
        columns = columns.len(),
        "bucket harmonized"
    );

    WideFrame {
        frequency,
        dates,
        columns,
    }
}

/// The value column plus one column per auxiliary column
/// (`{name}_{aux}`), each averaged per period.
fn period_columns(
    frequency: Frequency,
    table: &TimeSeriesTable,
    min_date: NaiveDate,
) -> Vec<(String, BTreeMap<NaiveDate, Option<f64>>)> {
    let width = 1 + table.aux_columns().len();
    let mut accumulators: Vec<BTreeMap<NaiveDate, Mean>> = vec![BTreeMap::new(); width];

    for row in table.rows() {
        let period = frequency.period_start(row.date);
        if period < min_date {
            continue;
        }
        let cells = std::iter::once(row.value).chain(row.aux.iter().copied());
        for (acc, cell) in accumulators.iter_mut().zip(cells) {
            acc.entry(period).or_default().push(cell);
        }
    }

    let names = std::iter::once(table.name().to_string()).chain(
        table
            .aux_columns()
            .iter()
            .map(|aux| format!("{}_{aux}", table.name())),
    );

    names
        .zip(accumulators)
        .map(|(name, acc)| {
            let values = acc.into_iter().map(|(d, m)| (d, m.value())).collect();
            (name, values)
        })
        .collect()
}

/// Running mean that ignores missing cells.
#[derive(Debug, Clone, Copy, Default)]
struct Mean {
    sum: f64,
    count: u32,
}

impl Mean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn value(self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / f64::from(self.count))
    }
}
