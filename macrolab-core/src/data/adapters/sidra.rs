//! IBGE SIDRA table API.
//!
//! Responses are a JSON array of string maps. The first element repeats the
//! column labels (`"V": "Valor"`), and suppressed cells carry `...` or `-`;
//! both are dropped before the numeric coercion.

use super::{fetch_single, SourceAdapter};
use crate::data::error::{CollectionError, DataError};
use crate::data::fetcher::Fetcher;
use crate::data::parse::parse_decimal;
use crate::domain::{DateWindow, Frequency, Observation, SeriesRequest, Source, TimeSeriesTable};
use chrono::NaiveDate;
use std::collections::HashMap;

const PLACEHOLDERS: [&str; 3] = ["Valor", "...", "-"];

#[derive(Debug, Clone, Copy, Default)]
pub struct SidraAdapter;

impl SidraAdapter {
    pub fn url(base: &str) -> String {
        format!("{}?formato=json", base.trim())
    }
}

impl SourceAdapter for SidraAdapter {
    fn source(&self) -> Source {
        Source::IbgeSidra
    }

    fn collect(
        &self,
        fetcher: &Fetcher,
        request: &SeriesRequest,
        _span: DateWindow,
    ) -> Result<TimeSeriesTable, CollectionError> {
        let url = Self::url(&request.collection_input);
        fetch_single(fetcher, request, &url, |body| {
            parse(body, &request.identifier, request.frequency)
        })
    }
}

pub(crate) fn parse(
    body: &[u8],
    name: &str,
    frequency: Frequency,
) -> Result<TimeSeriesTable, DataError> {
    let records: Vec<HashMap<String, serde_json::Value>> = serde_json::from_slice(body)
        .map_err(|e| DataError::Parse(format!("SIDRA JSON: {e}")))?;

    let mut rows = Vec::with_capacity(records.len());
    for record in &records {
        let value = text(record, "V")?;
        if PLACEHOLDERS.contains(&value.trim()) {
            continue;
        }
        let period = text(record, "D3C")?;
        let date = period_date(&period, frequency)
            .ok_or_else(|| DataError::Parse(format!("period code '{period}'")))?;
        rows.push(Observation::new(date, parse_decimal(&value, '.')));
    }

    Ok(TimeSeriesTable::new(name, rows))
}

fn text(record: &HashMap<String, serde_json::Value>, key: &str) -> Result<String, DataError> {
    match record.get(key) {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(serde_json::Value::Null) | None => Err(DataError::MissingColumn {
            column: key.to_string(),
        }),
        Some(other) => Ok(other.to_string()),
    }
}

/// `YYYYMM` (monthly), `YYYY0Q` (quarterly) or `YYYY` (annual) to the first
/// day of the period.
fn period_date(code: &str, frequency: Frequency) -> Option<NaiveDate> {
    let code = code.trim();
    if !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = code.get(..4)?.parse().ok()?;
    match (frequency, code.len()) {
        (Frequency::Quarterly, 6) => {
            let quarter: u32 = code.get(4..)?.parse().ok()?;
            if !(1..=4).contains(&quarter) {
                return None;
            }
            NaiveDate::from_ymd_opt(year, (quarter - 1) * 3 + 1, 1)
        }
        (_, 6) => NaiveDate::from_ymd_opt(year, code.get(4..)?.parse().ok()?, 1),
        (_, 4) => NaiveDate::from_ymd_opt(year, 1, 1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn drops_header_and_placeholder_rows() {
        let body = br#"[
            {"NC":"Nivel","V":"Valor","D3C":"Mes (Codigo)"},
            {"NC":"1","V":"100","D3C":"202001"},
            {"NC":"1","V":"...","D3C":"202002"},
            {"NC":"1","V":"-","D3C":"202003"}
        ]"#;
        let table = parse(body, "pms", Frequency::Monthly).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(d(2020, 1)), Some(Some(100.0)));
    }

    #[test]
    fn quarterly_codes_map_to_quarter_start() {
        let body = br#"[{"V":"1.5","D3C":"202003"},{"V":"X","D3C":"202004"}]"#;
        let table = parse(body, "pib", Frequency::Quarterly).unwrap();
        assert_eq!(table.get(d(2020, 7)), Some(Some(1.5)));
        // Unknown markers coerce to missing rather than failing.
        assert_eq!(table.get(d(2020, 10)), Some(None));
    }

    #[test]
    fn period_codes() {
        assert_eq!(period_date("199912", Frequency::Monthly), Some(d(1999, 12)));
        assert_eq!(period_date("2021", Frequency::Annual), Some(d(2021, 1)));
        assert_eq!(period_date("202005", Frequency::Quarterly), None);
        assert_eq!(period_date("202013", Frequency::Monthly), None);
        assert_eq!(period_date("20a001", Frequency::Monthly), None);
    }

    #[test]
    fn missing_period_column() {
        let err = parse(br#"[{"V":"1"}]"#, "x", Frequency::Monthly).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { column } if column == "D3C"));
    }
}
