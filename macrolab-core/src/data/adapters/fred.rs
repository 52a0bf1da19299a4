//! FRED public graph CSV export.

use super::{fetch_single, SourceAdapter};
use crate::data::error::{CollectionError, DataError};
use crate::data::fetcher::Fetcher;
use crate::data::parse::{parse_decimal, parse_iso_date, read_csv, CsvOptions};
use crate::domain::{DateWindow, Observation, SeriesRequest, Source, TimeSeriesTable};

/// Older exports name the date column `DATE`, newer ones `observation_date`.
const DATE_COLUMNS: [&str; 2] = ["DATE", "observation_date"];

#[derive(Debug, Clone, Copy, Default)]
pub struct FredAdapter;

impl FredAdapter {
    pub fn url(code: &str) -> String {
        format!("https://fred.stlouisfed.org/graph/fredgraph.csv?id={}", code.trim())
    }
}

impl SourceAdapter for FredAdapter {
    fn source(&self) -> Source {
        Source::Fred
    }

    fn collect(
        &self,
        fetcher: &Fetcher,
        request: &SeriesRequest,
        _span: DateWindow,
    ) -> Result<TimeSeriesTable, CollectionError> {
        let code = request.collection_input.trim();
        let url = Self::url(code);
        fetch_single(fetcher, request, &url, |body| {
            parse(body, code, &request.identifier)
        })
    }
}

pub(crate) fn parse(body: &[u8], code: &str, name: &str) -> Result<TimeSeriesTable, DataError> {
    let table = read_csv(body, CsvOptions::STANDARD)?;
    let date_col = DATE_COLUMNS
        .iter()
        .find_map(|c| table.find_column(c))
        .ok_or_else(|| DataError::MissingColumn {
            column: DATE_COLUMNS[0].into(),
        })?;
    let value_col = table.column(code)?;

    let rows = table
        .rows
        .iter()
        .map(|row| {
            let raw_date = table.cell(row, date_col);
            let date = parse_iso_date(raw_date)
                .ok_or_else(|| DataError::Parse(format!("date '{raw_date}'")))?;
            Ok(Observation::new(date, parse_decimal(table.cell(row, value_col), '.')))
        })
        .collect::<Result<Vec<_>, DataError>>()?;

    Ok(TimeSeriesTable::new(name, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn dot_means_missing() {
        let body = b"observation_date,DGS10\n2024-01-01,.\n2024-01-02,3.95\n";
        let table = parse(body, "DGS10", "us10y").unwrap();
        assert_eq!(table.name(), "us10y");
        assert_eq!(table.value_count(), 1);
        assert_eq!(
            table.get(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            Some(None)
        );
    }

    #[test]
    fn accepts_legacy_date_header() {
        let table = parse(b"DATE,CPIAUCSL\n2020-01-01,259.1\n", "CPIAUCSL", "cpi").unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn series_column_must_match_code() {
        let err = parse(b"DATE,OTHER\n2020-01-01,1\n", "CPIAUCSL", "cpi").unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { column } if column == "CPIAUCSL"));
    }
}
