//! The uniform output shape of every adapter.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One dated value, plus any auxiliary values (e.g. confidence bounds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    /// `None` when the upstream value was missing or failed numeric coercion.
    pub value: Option<f64>,
    /// Aligned with the owning table's `aux_columns`.
    pub aux: Vec<Option<f64>>,
}

impl Observation {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Self {
            date,
            value,
            aux: Vec::new(),
        }
    }

    pub fn with_aux(date: NaiveDate, value: Option<f64>, aux: Vec<Option<f64>>) -> Self {
        Self { date, value, aux }
    }
}

/// A named series keyed by calendar date.
///
/// Invariant: dates are strictly increasing. Every constructor sorts the rows
/// (stable) and collapses duplicate dates keeping the first occurrence, so
/// concatenating overlapping fetch windows never yields repeated days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesTable {
    name: String,
    aux_columns: Vec<String>,
    rows: Vec<Observation>,
}

impl TimeSeriesTable {
    pub fn new(name: impl Into<String>, rows: Vec<Observation>) -> Self {
        Self::with_aux(name, Vec::new(), rows)
    }

    /// Build a table carrying auxiliary columns. Each row's `aux` is resized
    /// to the number of auxiliary columns (padding with `None`).
    pub fn with_aux(
        name: impl Into<String>,
        aux_columns: Vec<String>,
        mut rows: Vec<Observation>,
    ) -> Self {
        for row in &mut rows {
            row.aux.resize(aux_columns.len(), None);
        }
        normalize(&mut rows);
        Self {
            name: name.into(),
            aux_columns,
            rows,
        }
    }

    /// Union several tables on the time axis.
    ///
    /// Name and auxiliary columns come from the first table. On equal dates the
    /// row from the earlier table wins. Returns `None` for an empty input.
    pub fn union(tables: impl IntoIterator<Item = TimeSeriesTable>) -> Option<Self> {
        let mut iter = tables.into_iter();
        let first = iter.next()?;
        let name = first.name;
        let aux_columns = first.aux_columns;
        let mut rows = first.rows;
        for table in iter {
            rows.extend(table.rows);
        }
        Some(Self::with_aux(name, aux_columns, rows))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aux_columns(&self) -> &[String] {
        &self.aux_columns
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Observation> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.iter().map(|r| r.date)
    }

    /// Value at `date`, if the date is present.
    pub fn get(&self, date: NaiveDate) -> Option<Option<f64>> {
        self.rows
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| self.rows[i].value)
    }

    /// Count of rows whose value is present.
    pub fn value_count(&self) -> usize {
        self.rows.iter().filter(|r| r.value.is_some()).count()
    }
}

fn normalize(rows: &mut Vec<Observation>) {
    rows.sort_by_key(|r| r.date);
    rows.dedup_by_key(|r| r.date);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn construction_sorts_and_keeps_first_duplicate() {
        let table = TimeSeriesTable::new(
            "cambio",
            vec![
                Observation::new(d(2024, 1, 3), Some(3.0)),
                Observation::new(d(2024, 1, 1), Some(1.0)),
                Observation::new(d(2024, 1, 3), Some(99.0)),
                Observation::new(d(2024, 1, 2), None),
            ],
        );

        let dates: Vec<_> = table.dates().collect();
        assert_eq!(dates, vec![d(2024, 1, 1), d(2024, 1, 2), d(2024, 1, 3)]);
        assert_eq!(table.get(d(2024, 1, 3)), Some(Some(3.0)));
        assert_eq!(table.get(d(2024, 1, 2)), Some(None));
        assert_eq!(table.get(d(2024, 1, 4)), None);
        assert_eq!(table.value_count(), 2);
    }

    #[test]
    fn union_deduplicates_shared_boundary_day() {
        let a = TimeSeriesTable::new(
            "selic",
            vec![
                Observation::new(d(2020, 1, 1), Some(1.0)),
                Observation::new(d(2020, 1, 2), Some(2.0)),
            ],
        );
        let b = TimeSeriesTable::new(
            "selic",
            vec![
                Observation::new(d(2020, 1, 2), Some(2.5)),
                Observation::new(d(2020, 1, 3), Some(3.0)),
            ],
        );

        let merged = TimeSeriesTable::union(vec![a, b]).unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get(d(2020, 1, 2)), Some(Some(2.0)));
        assert_eq!(merged.first_date(), Some(d(2020, 1, 1)));
        assert_eq!(merged.last_date(), Some(d(2020, 1, 3)));
    }

    #[test]
    fn union_of_nothing_is_none() {
        assert!(TimeSeriesTable::union(Vec::new()).is_none());
    }

    #[test]
    fn aux_values_are_padded_to_column_count() {
        let table = TimeSeriesTable::with_aux(
            "hiato",
            vec!["lim_inf".into(), "lim_sup".into()],
            vec![Observation::with_aux(d(2020, 1, 1), Some(-1.0), vec![Some(-2.0)])],
        );
        assert_eq!(table.rows()[0].aux, vec![Some(-2.0), None]);
    }
}
