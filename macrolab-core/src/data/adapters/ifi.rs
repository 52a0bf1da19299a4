//! IFI output-gap workbook.
//!
//! The sheet `Hiato do Produto` has two title rows and a header row, then
//! `date, lower bound, estimate, upper bound` in the first four columns. The
//! bounds travel with the series as auxiliary columns.

use super::{fetch_single, SourceAdapter};
use crate::data::error::{CollectionError, DataError};
use crate::data::fetcher::Fetcher;
use crate::data::parse::{parse_decimal, parse_flexible_date};
use crate::domain::{DateWindow, Observation, SeriesRequest, Source, TimeSeriesTable};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{Days, NaiveDate};
use std::io::Cursor;
use tracing::debug;

pub const SHEET: &str = "Hiato do Produto";
pub const AUX_COLUMNS: [&str; 2] = ["lim_inf", "lim_sup"];

/// Absolute index of the first data row.
const FIRST_DATA_ROW: u32 = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct IfiAdapter;

impl SourceAdapter for IfiAdapter {
    fn source(&self) -> Source {
        Source::Ifi
    }

    fn collect(
        &self,
        fetcher: &Fetcher,
        request: &SeriesRequest,
        _span: DateWindow,
    ) -> Result<TimeSeriesTable, CollectionError> {
        let locator = request.collection_input.trim();
        fetch_single(fetcher, request, locator, |body| {
            parse(body, &request.identifier)
        })
    }
}

pub(crate) fn parse(body: &[u8], name: &str) -> Result<TimeSeriesTable, DataError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(body.to_vec()))
        .map_err(|e| DataError::Parse(format!("workbook: {e}")))?;
    let range = workbook
        .worksheet_range(SHEET)
        .map_err(|e| DataError::Parse(format!("sheet '{SHEET}': {e}")))?;

    if range.is_empty() {
        return Ok(empty(name));
    }
    let (last_row, _) = range.end().unwrap_or_default();

    let mut rows = Vec::new();
    for row in FIRST_DATA_ROW..=last_row {
        let cell = |col: u32| range.get_value((row, col)).unwrap_or(&Data::Empty);
        let lower = number(cell(1));
        let estimate = number(cell(2));
        let upper = number(cell(3));

        match date(cell(0)) {
            Some(date) => rows.push(Observation::with_aux(date, estimate, vec![lower, upper])),
            None if is_blank(cell(0)) || (lower, estimate, upper) == (None, None, None) => {
                debug!(row, "skipping workbook row without data");
            }
            None => {
                return Err(DataError::Parse(format!(
                    "row {}: date cell '{}'",
                    row + 1,
                    cell(0)
                )))
            }
        }
    }

    Ok(TimeSeriesTable::with_aux(
        name,
        AUX_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    ))
}

fn empty(name: &str) -> TimeSeriesTable {
    TimeSeriesTable::with_aux(
        name,
        AUX_COLUMNS.iter().map(|c| c.to_string()).collect(),
        Vec::new(),
    )
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime().map(|t| t.date()),
        Data::DateTimeIso(s) | Data::String(s) => parse_flexible_date(s),
        Data::Float(f) => excel_serial(*f),
        Data::Int(i) => excel_serial(*i as f64),
        _ => None,
    }
}

fn number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f).filter(|v| v.is_finite()),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => parse_decimal(s, '.').or_else(|| parse_decimal(s, ',')),
        _ => None,
    }
}

/// Last serial Excel can represent (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Excel's 1900 date system, counted from 1899-12-30.
fn excel_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.trunc() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::adapters::testing::{fetcher, MapTransport};
    use crate::domain::Frequency;
    use rust_xlsxwriter::Workbook;
    use std::sync::Arc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Workbook shaped like the published output-gap file: a notes sheet,
    /// then the gap sheet with two title rows, a header row, data and
    /// trailing footnotes.
    fn gap_workbook() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let notes = workbook.add_worksheet();
        notes.set_name("Notas").unwrap();
        notes.write_string(0, 0, "Data").unwrap();
        notes.write_string(1, 0, "not a date").unwrap();

        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET).unwrap();
        sheet.write_string(0, 0, "Hiato do produto estimado pela IFI").unwrap();
        sheet.write_string(1, 0, "Em % do PIB potencial").unwrap();
        for (col, header) in ["Data", "Lim. inferior", "Hiato", "Lim. superior"]
            .into_iter()
            .enumerate()
        {
            sheet.write_string(2, col as u16, header).unwrap();
        }
        // Serial date.
        sheet.write_number(3, 0, 43831.0).unwrap();
        sheet.write_number(3, 1, -2.1).unwrap();
        sheet.write_number(3, 2, -1.5).unwrap();
        sheet.write_number(3, 3, -0.9).unwrap();
        // Text date with text numbers.
        sheet.write_string(4, 0, "2020-04-01").unwrap();
        sheet.write_string(4, 1, "-8,0").unwrap();
        sheet.write_number(4, 2, -6.5).unwrap();
        sheet.write_number(4, 3, -5.0).unwrap();
        // Estimate without bounds.
        sheet.write_number(5, 0, 44013.0).unwrap();
        sheet.write_number(5, 2, -4.25).unwrap();
        // Footnotes.
        sheet.write_string(7, 4, "Fonte: IFI").unwrap();
        sheet.write_string(8, 0, "Elaboração: IFI").unwrap();
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn reads_gap_sheet_below_titles_and_header() {
        let table = parse(&gap_workbook(), "hiato").unwrap();

        assert_eq!(table.name(), "hiato");
        assert_eq!(table.aux_columns(), &["lim_inf".to_string(), "lim_sup".to_string()]);
        assert_eq!(
            table.dates().collect::<Vec<_>>(),
            vec![d(2020, 1, 1), d(2020, 4, 1), d(2020, 7, 1)]
        );

        let rows = table.rows();
        assert_eq!(rows[0].value, Some(-1.5));
        assert_eq!(rows[0].aux, vec![Some(-2.1), Some(-0.9)]);
        assert_eq!(rows[1].value, Some(-6.5));
        assert_eq!(rows[1].aux, vec![Some(-8.0), Some(-5.0)]);
        assert_eq!(rows[2].value, Some(-4.25));
        assert_eq!(rows[2].aux, vec![None, None]);
    }

    #[test]
    fn bad_date_with_data_is_a_parse_error() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET).unwrap();
        sheet.write_string(2, 0, "Data").unwrap();
        sheet.write_string(3, 0, "1T2020").unwrap();
        sheet.write_number(3, 2, -1.0).unwrap();
        let body = workbook.save_to_buffer().unwrap();

        let err = parse(&body, "hiato").unwrap_err();
        assert!(matches!(err, DataError::Parse(m) if m.contains("row 4")));
    }

    #[test]
    fn missing_sheet_is_a_parse_error() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet().set_name("Outra").unwrap();
        let body = workbook.save_to_buffer().unwrap();
        assert!(matches!(parse(&body, "hiato"), Err(DataError::Parse(m)) if m.contains(SHEET)));
    }

    #[test]
    fn adapter_reads_workbook_from_locator() {
        let transport = Arc::new(MapTransport::with("ifi/hiato.xlsx", gap_workbook()));
        let request = SeriesRequest::api(Source::Ifi, " ifi/hiato.xlsx ", "hiato", Frequency::Quarterly);
        let span = DateWindow::new(d(2000, 1, 1), d(2030, 1, 1));

        let table = IfiAdapter.collect(&fetcher(transport), &request, span).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(d(2020, 7, 1)), Some(Some(-4.25)));
    }

    #[test]
    fn excel_serial_dates() {
        assert_eq!(excel_serial(43831.0), NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(excel_serial(36526.5), NaiveDate::from_ymd_opt(2000, 1, 1));
        assert_eq!(excel_serial(0.0), None);
        assert_eq!(excel_serial(MAX_EXCEL_SERIAL), NaiveDate::from_ymd_opt(9999, 12, 31));
    }

    #[test]
    fn out_of_range_serials_are_not_dates() {
        for serial in [1e20, f64::MAX, MAX_EXCEL_SERIAL + 1.0, -5.0, f64::NAN] {
            assert_eq!(excel_serial(serial), None);
        }
        assert_eq!(date(&Data::Float(1e20)), None);
    }

    #[test]
    fn cell_coercion() {
        assert_eq!(number(&Data::Float(-1.25)), Some(-1.25));
        assert_eq!(number(&Data::String("-1,25".into())), Some(-1.25));
        assert_eq!(number(&Data::Empty), None);
        assert_eq!(
            date(&Data::String("2020-03-01".into())),
            NaiveDate::from_ymd_opt(2020, 3, 1)
        );
        assert!(is_blank(&Data::String("  ".into())));
    }

    #[test]
    fn non_workbook_bytes_are_a_parse_error() {
        assert!(matches!(parse(b"data;valor\n", "hiato"), Err(DataError::Parse(_))));
    }
}
