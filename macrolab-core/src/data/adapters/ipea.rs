//! IPEADATA OData v4 API.

use super::{fetch_single, SourceAdapter};
use crate::data::error::{CollectionError, DataError};
use crate::data::fetcher::Fetcher;
use crate::data::parse::{parse_decimal, parse_iso_date};
use crate::domain::{DateWindow, Observation, SeriesRequest, Source, TimeSeriesTable};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default)]
pub struct IpeaAdapter;

impl IpeaAdapter {
    pub fn url(code: &str) -> String {
        format!(
            "http://www.ipeadata.gov.br/api/odata4/ValoresSerie(SERCODIGO='{}')",
            code.trim()
        )
    }
}

impl SourceAdapter for IpeaAdapter {
    fn source(&self) -> Source {
        Source::Ipeadata
    }

    fn collect(
        &self,
        fetcher: &Fetcher,
        request: &SeriesRequest,
        _span: DateWindow,
    ) -> Result<TimeSeriesTable, CollectionError> {
        let url = Self::url(&request.collection_input);
        fetch_single(fetcher, request, &url, |body| parse(body, &request.identifier))
    }
}

#[derive(Deserialize)]
struct Envelope {
    value: Vec<Record>,
}

#[derive(Deserialize)]
struct Record {
    #[serde(rename = "VALDATA")]
    date: Option<String>,
    #[serde(rename = "VALVALOR", default)]
    value: serde_json::Value,
}

/// Numbers pass through; numeric strings are coerced; anything else is missing.
fn coerce(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        serde_json::Value::String(s) => parse_decimal(s, '.'),
        _ => None,
    }
}

pub(crate) fn parse(body: &[u8], name: &str) -> Result<TimeSeriesTable, DataError> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| DataError::Parse(format!("IPEADATA JSON: {e}")))?;

    let rows = envelope
        .value
        .into_iter()
        .map(|record| {
            let raw = record
                .date
                .ok_or_else(|| DataError::MissingColumn {
                    column: "VALDATA".into(),
                })?;
            let date = parse_iso_date(&raw)
                .ok_or_else(|| DataError::Parse(format!("date '{raw}'")))?;
            Ok(Observation::new(date, coerce(&record.value)))
        })
        .collect::<Result<Vec<_>, DataError>>()?;

    Ok(TimeSeriesTable::new(name, rows))
}
