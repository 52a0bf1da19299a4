//! Source adapters: one per upstream provider.
//!
//! An adapter turns a [`SeriesRequest`] into the request(s) its provider
//! understands, runs them through the shared [`Fetcher`], and normalizes the
//! payload into a [`TimeSeriesTable`] named after the request identifier.
//! Every failure below this boundary surfaces as one [`CollectionError`].

mod fred;
mod ifi;
mod ipea;
mod odata;
mod sgs;
mod sidra;

pub use fred::FredAdapter;
pub use ifi::IfiAdapter;
pub use ipea::IpeaAdapter;
pub use odata::OdataAdapter;
pub use sgs::SgsAdapter;
pub use sidra::SidraAdapter;

use super::error::{CollectionError, DataError};
use super::fetcher::Fetcher;
use crate::config::CollectorConfig;
use crate::domain::{DateWindow, SeriesRequest, Source, TimeSeriesTable};
use tracing::{error, info};

/// Collects one series from one provider.
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> Source;

    /// Collect `request` over `span`. Adapters whose provider has no date
    /// parameters ignore the span and return the full history.
    fn collect(
        &self,
        fetcher: &Fetcher,
        request: &SeriesRequest,
        span: DateWindow,
    ) -> Result<TimeSeriesTable, CollectionError>;
}

/// The adapter for `source`, configured from `config`.
pub fn adapter_for(source: Source, config: &CollectorConfig) -> Box<dyn SourceAdapter> {
    match source {
        Source::BcbSgs => Box::new(SgsAdapter {
            window_years: config.window_years,
            require_all_windows: config.sgs.require_all_windows,
        }),
        Source::BcbOdata => Box::new(OdataAdapter),
        Source::Ipeadata => Box::new(IpeaAdapter),
        Source::IbgeSidra => Box::new(SidraAdapter),
        Source::Fred => Box::new(FredAdapter),
        Source::Ifi => Box::new(IfiAdapter),
    }
}

/// Wrap any failure into the uniform collection error for `request`.
pub(crate) fn guard<T>(
    request: &SeriesRequest,
    result: Result<T, DataError>,
) -> Result<T, CollectionError> {
    result.map_err(|cause| {
        error!(
            code = %request.collection_input,
            series = %request.identifier,
            error = %cause,
            "series collection failed"
        );
        CollectionError::new(&request.collection_input, &request.identifier, cause)
    })
}

pub(crate) fn log_start(request: &SeriesRequest) {
    info!(
        source = %request.source,
        code = %request.collection_input,
        series = %request.identifier,
        frequency = %request.frequency,
        "collecting series"
    );
}

/// Single-locator collection shared by the adapters without windowing.
pub(crate) fn fetch_single<F>(
    fetcher: &Fetcher,
    request: &SeriesRequest,
    locator: &str,
    parse: F,
) -> Result<TimeSeriesTable, CollectionError>
where
    F: Fn(&[u8]) -> Result<TimeSeriesTable, DataError>,
{
    log_start(request);
    guard(request, fetcher.fetch(locator, parse).into_result(locator))
}
