//! Metadata table: the list of series a run collects.
//!
//! Read from a CSV or an XLSX workbook (sheet `Metadados`). Each row names
//! the provider (`Fonte`), how it is collected (`Forma de Coleta`), the
//! provider-specific locator (`Input de Coleta`), the output column
//! (`Identificador`) and the frequency bucket (`Frequência`).

use super::error::DataError;
use super::fetcher::Fetcher;
use super::parse::{read_csv, sniff_delimiter, CsvOptions};
use crate::domain::frequency::fold_label;
use crate::domain::{CollectionMethod, Frequency, SeriesRequest, Source};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::collections::HashSet;
use std::io::Cursor;
use tracing::{info, warn};

pub const METADATA_SHEET: &str = "Metadados";

const COL_SOURCE: &str = "Fonte";
const COL_METHOD: &str = "Forma de Coleta";
const COL_INPUT: &str = "Input de Coleta";
const COL_IDENTIFIER: &str = "Identificador";
const COL_FREQUENCY: &str = "Frequência";

const REQUIRED: [&str; 5] = [
    COL_SOURCE,
    COL_METHOD,
    COL_INPUT,
    COL_IDENTIFIER,
    COL_FREQUENCY,
];

/// Parsed metadata: recognized rows in file order plus a count of rows whose
/// source or frequency label was not understood.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataTable {
    pub requests: Vec<SeriesRequest>,
    pub unrecognized: usize,
}

impl MetadataTable {
    /// Rows the orchestrator will actually collect.
    pub fn collectable(&self) -> impl Iterator<Item = &SeriesRequest> {
        self.requests.iter().filter(|r| r.is_collectable())
    }
}

/// Fetch and parse the metadata table behind `locator`.
///
/// Only the read is retried; a malformed table fails on the first parse.
pub fn load_metadata(fetcher: &Fetcher, locator: &str) -> Result<MetadataTable, DataError> {
    let body = fetcher
        .fetch(locator, |body| Ok(body.to_vec()))
        .into_result(locator)?;
    let table = parse_metadata(&body, looks_like_workbook_locator(locator))?;
    info!(
        locator,
        rows = table.requests.len(),
        unrecognized = table.unrecognized,
        "metadata loaded"
    );
    Ok(table)
}

/// Parse metadata bytes. Workbooks are recognized by `hint_xlsx` or by their
/// magic bytes; anything else is read as CSV.
pub fn parse_metadata(body: &[u8], hint_xlsx: bool) -> Result<MetadataTable, DataError> {
    let (headers, rows) = if hint_xlsx || is_workbook(body) {
        read_workbook(body)?
    } else {
        let csv = read_csv(
            body,
            CsvOptions {
                delimiter: sniff_delimiter(body),
                decimal: '.',
            },
        )?;
        (csv.headers, csv.rows)
    };
    build(&headers, &rows)
}

fn looks_like_workbook_locator(locator: &str) -> bool {
    let lower = locator.to_ascii_lowercase();
    let path = lower.split('?').next().unwrap_or_default();
    path.ends_with(".xlsx") || path.ends_with(".xls") || lower.contains("format=xlsx")
}

fn is_workbook(body: &[u8]) -> bool {
    // ZIP container (xlsx) or OLE2 compound file (xls).
    body.starts_with(b"PK\x03\x04") || body.starts_with(&[0xD0, 0xCF, 0x11, 0xE0])
}

fn read_workbook(body: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>), DataError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(body.to_vec()))
        .map_err(|e| DataError::Metadata(format!("workbook: {e}")))?;
    let range = workbook
        .worksheet_range(METADATA_SHEET)
        .map_err(|e| DataError::Metadata(format!("sheet '{METADATA_SHEET}': {e}")))?;

    let mut rows = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    let headers = rows
        .next()
        .ok_or_else(|| DataError::Metadata(format!("sheet '{METADATA_SHEET}' is empty")))?;
    Ok((headers, rows.collect()))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn build(headers: &[String], rows: &[Vec<String>]) -> Result<MetadataTable, DataError> {
    let folded: Vec<String> = headers.iter().map(|h| fold_label(h)).collect();
    let position = |name: &str| -> Result<usize, DataError> {
        let key = fold_label(name);
        folded
            .iter()
            .position(|h| *h == key)
            .ok_or_else(|| DataError::Metadata(format!("missing column '{name}'")))
    };
    let cols = REQUIRED
        .iter()
        .map(|name| position(name))
        .collect::<Result<Vec<_>, _>>()?;
    let (source_col, method_col, input_col, id_col, freq_col) =
        (cols[0], cols[1], cols[2], cols[3], cols[4]);

    let mut table = MetadataTable::default();
    let mut seen = HashSet::new();

    for (index, row) in rows.iter().enumerate() {
        let cell = |col: usize| row.get(col).map(|s| s.trim()).unwrap_or("");
        if cols.iter().all(|c| cell(*c).is_empty()) {
            continue;
        }
        // Header is line 1 of the file.
        let line = index + 2;

        let (Some(source), Some(frequency)) = (
            Source::from_label(cell(source_col)),
            Frequency::from_label(cell(freq_col)),
        ) else {
            warn!(
                line,
                source = cell(source_col),
                frequency = cell(freq_col),
                "unrecognized metadata row"
            );
            table.unrecognized += 1;
            continue;
        };

        let identifier = cell(id_col);
        if identifier.is_empty() {
            return Err(DataError::Metadata(format!("line {line}: empty {COL_IDENTIFIER}")));
        }
        if !seen.insert(identifier.to_string()) {
            return Err(DataError::Metadata(format!(
                "line {line}: duplicate identifier '{identifier}'"
            )));
        }

        table.requests.push(SeriesRequest {
            source,
            collection_input: cell(input_col).to_string(),
            identifier: identifier.to_string(),
            frequency,
            collection_method: CollectionMethod::from_label(cell(method_col)),
        });
    }

    Ok(table)
}
