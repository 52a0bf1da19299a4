//! Collection orchestrator: runs every collectable metadata row through its
//! adapter and buckets the results by frequency.

use super::adapters::adapter_for;
use super::error::{CollectionError, DataError};
use super::fetcher::Fetcher;
use crate::clock::Clock;
use crate::config::{CollectorConfig, FailurePolicy};
use crate::domain::{DateWindow, Frequency, SeriesRequest, TimeSeriesTable};
use chrono::Months;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One collected series, still tagged with the row it came from.
#[derive(Debug, Clone)]
pub struct CollectedSeries {
    pub request: SeriesRequest,
    pub table: TimeSeriesTable,
}

/// Progress callback for a collection run.
pub trait CollectionProgress: Send {
    /// Called before a series is requested.
    fn on_start(&self, request: &SeriesRequest, index: usize, total: usize);

    /// Called when a series finishes, successfully or not.
    fn on_complete(
        &self,
        request: &SeriesRequest,
        index: usize,
        total: usize,
        result: &Result<usize, CollectionError>,
    );

    /// Called once the run is over.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Reports progress through `tracing`.
pub struct LogProgress;

impl CollectionProgress for LogProgress {
    fn on_start(&self, request: &SeriesRequest, index: usize, total: usize) {
        debug!(
            series = %request.identifier,
            position = index + 1,
            total,
            "series queued"
        );
    }

    fn on_complete(
        &self,
        request: &SeriesRequest,
        index: usize,
        total: usize,
        result: &Result<usize, CollectionError>,
    ) {
        match result {
            Ok(rows) => info!(
                series = %request.identifier,
                position = index + 1,
                total,
                rows,
                "series collected"
            ),
            Err(e) => warn!(
                series = %request.identifier,
                position = index + 1,
                total,
                error = %e,
                "series failed"
            ),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        info!(succeeded, failed, total, "collection complete");
    }
}

/// Outcome of a run.
#[derive(Debug, Default)]
pub struct CollectionReport {
    pub span: Option<DateWindow>,
    /// Collected tables per frequency, in metadata order.
    pub buckets: BTreeMap<Frequency, Vec<CollectedSeries>>,
    /// Rows not collected: manual collection or unsupported frequency.
    pub skipped: usize,
    pub failures: Vec<CollectionError>,
}

impl CollectionReport {
    pub fn collected(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Tables of each bucket, without the request tags.
    pub fn tables(&self) -> BTreeMap<Frequency, Vec<TimeSeriesTable>> {
        self.buckets
            .iter()
            .map(|(freq, series)| (*freq, series.iter().map(|s| s.table.clone()).collect()))
            .collect()
    }
}

/// Runs a collection pass. Holds no state between runs.
pub struct Collector {
    fetcher: Fetcher,
    config: CollectorConfig,
    clock: Arc<dyn Clock>,
}

impl Collector {
    pub fn new(fetcher: Fetcher, config: CollectorConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            fetcher,
            config,
            clock,
        }
    }

    /// `[start_date, today + horizon_months]`.
    pub fn span(&self) -> Result<DateWindow, DataError> {
        let today = self.clock.today();
        let end = today
            .checked_add_months(Months::new(self.config.horizon_months))
            .ok_or_else(|| {
                DataError::Config(format!(
                    "horizon of {} months from {today} is out of range",
                    self.config.horizon_months
                ))
            })?;
        let start = self.config.start_date;
        if start >= end {
            return Err(DataError::Config(format!(
                "start date {start} is not before end date {end}"
            )));
        }
        Ok(DateWindow::new(start, end))
    }

    /// Collect every API row whose source supports its frequency.
    ///
    /// Under [`FailurePolicy::Isolate`] failures are recorded in the report;
    /// under [`FailurePolicy::FailFast`] the first one is returned.
    pub fn run(
        &self,
        requests: &[SeriesRequest],
        progress: &dyn CollectionProgress,
    ) -> Result<CollectionReport, CollectionError> {
        let mut report = CollectionReport::default();
        let span = self
            .span()
            .map_err(|e| CollectionError::new("-", "collection span", e))?;
        report.span = Some(span);

        let selected: Vec<&SeriesRequest> = requests
            .iter()
            .filter(|r| {
                let keep = r.is_collectable();
                if !keep {
                    debug!(
                        series = %r.identifier,
                        source = %r.source,
                        frequency = %r.frequency,
                        method = ?r.collection_method,
                        "row skipped"
                    );
                }
                keep
            })
            .collect();
        report.skipped = requests.len() - selected.len();

        info!(
            span = %span,
            series = selected.len(),
            skipped = report.skipped,
            policy = ?self.config.failure_policy,
            "starting collection"
        );

        let total = selected.len();
        let mut succeeded = 0;

        for (i, request) in selected.into_iter().enumerate() {
            progress.on_start(request, i, total);

            let adapter = adapter_for(request.source, &self.config);
            let result = adapter.collect(&self.fetcher, request, span);
            let outcome = result.as_ref().map(TimeSeriesTable::len).map_err(Clone::clone);
            progress.on_complete(request, i, total, &outcome);

            match result {
                Ok(table) => {
                    succeeded += 1;
                    report
                        .buckets
                        .entry(request.frequency)
                        .or_default()
                        .push(CollectedSeries {
                            request: request.clone(),
                            table,
                        });
                }
                Err(e) => match self.config.failure_policy {
                    FailurePolicy::FailFast => {
                        progress.on_batch_complete(succeeded, 1, total);
                        return Err(e);
                    }
                    FailurePolicy::Isolate => report.failures.push(e),
                },
            }
        }

        progress.on_batch_complete(succeeded, report.failures.len(), total);
        Ok(report)
    }
}
