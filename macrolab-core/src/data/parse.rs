//! Shared parsing helpers: delimited text, locale decimals, date formats.

use super::error::DataError;
use crate::domain::parse_br;
use chrono::NaiveDate;

/// Delimiter and decimal separator of a delimited-text response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub decimal: char,
}

impl CsvOptions {
    /// `,`-separated, `.` decimals.
    pub const STANDARD: CsvOptions = CsvOptions {
        delimiter: b',',
        decimal: '.',
    };

    /// `;`-separated, `,` decimals (central-bank time-series CSV).
    pub const BRAZILIAN: CsvOptions = CsvOptions {
        delimiter: b';',
        decimal: ',',
    };
}

/// A parsed delimited-text table: trimmed headers and string cells.
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Position of a header, compared after trimming and ignoring ASCII case.
    pub fn column(&self, name: &str) -> Result<usize, DataError> {
        self.find_column(name).ok_or_else(|| DataError::MissingColumn {
            column: name.to_string(),
        })
    }

    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name.trim()))
    }

    /// Cell text, empty when the row is short.
    pub fn cell<'a>(&'a self, row: &'a [String], col: usize) -> &'a str {
        row.get(col).map(String::as_str).unwrap_or("")
    }
}

/// Parse delimited text into headers and rows.
pub fn read_csv(body: &[u8], options: CsvOptions) -> Result<CsvTable, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body);

    let headers = reader
        .headers()
        .map_err(|e| DataError::Parse(format!("csv header: {e}")))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect::<Vec<_>>();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(DataError::Parse("csv has no header row".into()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DataError::Parse(format!("csv record: {e}")))?;
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(CsvTable { headers, rows })
}

/// Guess the delimiter of a CSV from its first line (`;` or `,`).
pub fn sniff_delimiter(body: &[u8]) -> u8 {
    let first_line = body.split(|b| *b == b'\n').next().unwrap_or_default();
    let semicolons = first_line.iter().filter(|b| **b == b';').count();
    let commas = first_line.iter().filter(|b| **b == b',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

/// Numeric coercion. Placeholders and garbage become `None`, never an error.
pub fn parse_decimal(raw: &str, decimal: char) -> Option<f64> {
    let trimmed = raw.trim().trim_matches('"').trim();
    if trimmed.is_empty() || matches!(trimmed, "." | "-" | "..." | "NA" | "NaN") {
        return None;
    }
    let value = if decimal == '.' {
        trimmed.parse::<f64>().ok()?
    } else {
        trimmed.replace(decimal, ".").parse::<f64>().ok()?
    };
    value.is_finite().then_some(value)
}

/// ISO date, optionally followed by a time and offset
/// (`2020-01-01`, `2020-01-01T00:00:00-03:00`, `2020-01-01 00:00:00`).
/// Only the calendar date is kept.
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// ISO first, then `dd/mm/yyyy`.
pub fn parse_flexible_date(text: &str) -> Option<NaiveDate> {
    parse_iso_date(text).or_else(|| parse_br(text).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brazilian_csv_with_quotes_and_bom() {
        let body = "\u{feff}\"data\";\"valor\"\n\"02/01/2020\";\"4,0207\"\n\n\"03/01/2020\";\"\"\n";
        let table = read_csv(body.as_bytes(), CsvOptions::BRAZILIAN).unwrap();
        assert_eq!(table.headers, vec!["data", "valor"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.column("VALOR").unwrap(), 1);
        assert_eq!(parse_decimal(&table.rows[0][1], ','), Some(4.0207));
        assert_eq!(parse_decimal(&table.rows[1][1], ','), None);
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let table = read_csv(b"a,b\n1,2\n", CsvOptions::STANDARD).unwrap();
        match table.column("Mediana") {
            Err(DataError::MissingColumn { column }) => assert_eq!(column, "Mediana"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn decimal_coercion() {
        assert_eq!(parse_decimal("1.5", '.'), Some(1.5));
        assert_eq!(parse_decimal("-0,25", ','), Some(-0.25));
        assert_eq!(parse_decimal(".", '.'), None);
        assert_eq!(parse_decimal("...", ','), None);
        assert_eq!(parse_decimal("abc", '.'), None);
        assert_eq!(parse_decimal("inf", '.'), None);
    }

    #[test]
    fn date_formats() {
        let d = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap();
        assert_eq!(parse_iso_date("2020-01-31"), Some(d));
        assert_eq!(parse_iso_date("2020-01-31T00:00:00-03:00"), Some(d));
        assert_eq!(parse_iso_date("2020-01-31 12:00:00"), Some(d));
        assert_eq!(parse_iso_date("31/01/2020"), None);
        assert_eq!(parse_flexible_date("31/01/2020"), Some(d));
    }

    #[test]
    fn delimiter_sniffing() {
        assert_eq!(sniff_delimiter(b"Fonte;Identificador;Input\nx;y;z"), b';');
        assert_eq!(sniff_delimiter(b"Fonte,Identificador\n"), b',');
    }
}
