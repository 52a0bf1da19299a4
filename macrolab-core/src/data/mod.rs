//! Data layer: fetching, source adapters, orchestration, harmonization and
//! parquet storage.
//!
//! Pipeline: metadata → [`Collector`] (adapters over a retrying
//! [`Fetcher`]) → [`harmonize`] → [`FrameStore`].

pub mod adapters;
pub mod collect;
pub mod error;
pub mod fetcher;
pub mod harmonize;
pub mod metadata;
pub mod parse;
pub mod split;
pub mod store;
pub mod transport;

pub use adapters::{adapter_for, SourceAdapter};
pub use collect::{CollectedSeries, CollectionProgress, CollectionReport, Collector, LogProgress};
pub use error::{CollectionError, DataError};
pub use fetcher::{FetchAttempt, Fetched, Fetcher, RetryPolicy, Sleeper, ThreadSleeper};
pub use harmonize::{harmonize, WideFrame};
pub use metadata::{load_metadata, parse_metadata, MetadataTable};
pub use split::{split_date_range, DEFAULT_SPAN_YEARS};
pub use store::{FrameMeta, FrameStatus, FrameStore};
pub use transport::{HttpTransport, Transport};
