//! Structured error types for collection, parsing and storage.

use crate::domain::Frequency;
use thiserror::Error;

/// Errors raised below the adapter boundary.
///
/// Fetch-level variants are retried by the fetcher; they only escape to a
/// caller wrapped in a [`CollectionError`].
#[derive(Debug, Clone, Error)]
pub enum DataError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status} from {locator}")]
    HttpStatus { status: u16, locator: String },

    #[error("response could not be parsed: {0}")]
    Parse(String),

    #[error("response is missing column '{column}'")]
    MissingColumn { column: String },

    #[error("no data from {locator} after {attempts} attempts")]
    NoData { locator: String, attempts: u32 },

    #[error("metadata error: {0}")]
    Metadata(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("no stored frame for frequency '{frequency}', run `collect` first")]
    NoStoredFrame { frequency: Frequency },
}

/// The single error kind adapters surface: one series could not be collected.
///
/// Carries the series code and human name so an operator can tell which of
/// the configured rows is broken.
#[derive(Debug, Clone, Error)]
#[error("collection failed for series {code} ({name}): {cause}")]
pub struct CollectionError {
    pub code: String,
    pub name: String,
    #[source]
    pub cause: DataError,
}

impl CollectionError {
    pub fn new(code: impl Into<String>, name: impl Into<String>, cause: DataError) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            cause,
        }
    }
}
