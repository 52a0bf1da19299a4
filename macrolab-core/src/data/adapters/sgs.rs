//! Central bank time-series system (SGS).
//!
//! Daily series are requested window by window; the provider rejects long
//! daily spans. Other frequencies take one request over the whole span.

use super::{guard, log_start, SourceAdapter};
use crate::data::error::{CollectionError, DataError};
use crate::data::fetcher::Fetcher;
use crate::data::parse::{parse_decimal, read_csv, CsvOptions};
use crate::data::split::{split_date_range, DEFAULT_SPAN_YEARS};
use crate::domain::{
    format_br, parse_br, DateWindow, Frequency, Observation, SeriesRequest, Source,
    TimeSeriesTable,
};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct SgsAdapter {
    /// Window length for daily requests; 0 requests the span at once.
    pub window_years: u32,
    /// Fail the series when any window comes back empty-handed.
    pub require_all_windows: bool,
}

impl Default for SgsAdapter {
    fn default() -> Self {
        Self {
            window_years: DEFAULT_SPAN_YEARS,
            require_all_windows: false,
        }
    }
}

impl SgsAdapter {
    pub fn url(code: &str, window: DateWindow) -> String {
        format!(
            "https://api.bcb.gov.br/dados/serie/bcdata.sgs.{}/dados?formato=csv&dataInicial={}&dataFinal={}",
            code.trim(),
            format_br(window.start),
            format_br(window.end)
        )
    }

    fn windows(&self, frequency: Frequency, span: DateWindow) -> Vec<DateWindow> {
        if frequency == Frequency::Daily {
            split_date_range(span.start, span.end, self.window_years)
        } else {
            vec![span]
        }
    }
}

impl SourceAdapter for SgsAdapter {
    fn source(&self) -> Source {
        Source::BcbSgs
    }

    fn collect(
        &self,
        fetcher: &Fetcher,
        request: &SeriesRequest,
        span: DateWindow,
    ) -> Result<TimeSeriesTable, CollectionError> {
        log_start(request);
        let windows = self.windows(request.frequency, span);
        if windows.is_empty() {
            return guard(
                request,
                Err(DataError::Validation(format!("empty date span {span}"))),
            );
        }

        let name = request.identifier.as_str();
        let mut tables = Vec::with_capacity(windows.len());
        let mut last_failure = None;

        for window in &windows {
            let url = Self::url(&request.collection_input, *window);
            match fetcher.fetch(&url, |body| parse(body, name)).into_result(&url) {
                Ok(table) => {
                    debug!(series = name, window = %window, rows = table.len(), "window collected");
                    tables.push(table);
                }
                Err(e) if self.require_all_windows => return guard(request, Err(e)),
                Err(e) => {
                    warn!(series = name, window = %window, error = %e, "window skipped");
                    last_failure = Some(e);
                }
            }
        }

        match (TimeSeriesTable::union(tables), last_failure) {
            (Some(table), _) => Ok(table),
            (None, Some(cause)) => guard(request, Err(cause)),
            (None, None) => guard(
                request,
                Err(DataError::Validation("no window produced data".into())),
            ),
        }
    }
}

/// `data;valor` CSV with `dd/mm/yyyy` dates and decimal commas.
pub(crate) fn parse(body: &[u8], name: &str) -> Result<TimeSeriesTable, DataError> {
    let table = read_csv(body, CsvOptions::BRAZILIAN)?;
    let date_col = table.column("data")?;
    let value_col = table.column("valor")?;

    let rows = table
        .rows
        .iter()
        .map(|row| {
            let raw_date = table.cell(row, date_col);
            let date = parse_br(raw_date)
                .map_err(|e| DataError::Parse(format!("date '{raw_date}': {e}")))?;
            Ok(Observation::new(date, parse_decimal(table.cell(row, value_col), ',')))
        })
        .collect::<Result<Vec<_>, DataError>>()?;

    Ok(TimeSeriesTable::new(name, rows))
}
