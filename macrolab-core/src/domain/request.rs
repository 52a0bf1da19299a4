//! Collection requests: one row of the metadata table.

use super::frequency::{fold_label, Frequency};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream source family. Each variant has exactly one adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Source {
    /// Central bank time-series API (SGS).
    BcbSgs,
    /// Central bank OData API (market expectations).
    BcbOdata,
    /// IPEADATA OData API.
    Ipeadata,
    /// IBGE SIDRA JSON API.
    IbgeSidra,
    /// FRED public CSV endpoint.
    Fred,
    /// IFI output-gap spreadsheet.
    Ifi,
}

impl Source {
    pub const ALL: [Source; 6] = [
        Source::BcbSgs,
        Source::BcbOdata,
        Source::Ipeadata,
        Source::IbgeSidra,
        Source::Fred,
        Source::Ifi,
    ];

    /// Parse the `Fonte` label of the metadata table.
    pub fn from_label(label: &str) -> Option<Self> {
        let folded = fold_label(label);
        Self::ALL
            .into_iter()
            .find(|source| fold_label(source.label()) == folded)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::BcbSgs => "BCB/SGS",
            Self::BcbOdata => "BCB/ODATA",
            Self::Ipeadata => "IPEADATA",
            Self::IbgeSidra => "IBGE/SIDRA",
            Self::Fred => "FRED",
            Self::Ifi => "IFI",
        }
    }

    /// Frequencies this source is collected at. Any other combination found
    /// in the metadata is skipped by the orchestrator.
    pub fn supported_frequencies(self) -> &'static [Frequency] {
        use Frequency::*;
        match self {
            Self::BcbSgs => &[Daily, Monthly, Quarterly, Annual],
            Self::BcbOdata => &[Monthly, Quarterly],
            Self::Ipeadata => &[Daily, Monthly],
            Self::IbgeSidra => &[Monthly, Quarterly],
            Self::Fred => &[Daily, Monthly, Quarterly],
            Self::Ifi => &[Quarterly],
        }
    }

    pub fn supports(self, frequency: Frequency) -> bool {
        self.supported_frequencies().contains(&frequency)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a series is obtained (`Forma de Coleta`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionMethod {
    Api,
    /// Anything else (manual upload, spreadsheet kept by hand, ...). Carries
    /// the original label.
    Manual(String),
}

impl CollectionMethod {
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("api") {
            Self::Api
        } else {
            Self::Manual(label.trim().to_string())
        }
    }

    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api)
    }
}

/// One series to collect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRequest {
    pub source: Source,
    /// Adapter-specific locator: numeric code, full URL or spreadsheet path.
    pub collection_input: String,
    /// Output column name, unique across a metadata table.
    pub identifier: String,
    pub frequency: Frequency,
    pub collection_method: CollectionMethod,
}

impl SeriesRequest {
    pub fn api(
        source: Source,
        collection_input: impl Into<String>,
        identifier: impl Into<String>,
        frequency: Frequency,
    ) -> Self {
        Self {
            source,
            collection_input: collection_input.into(),
            identifier: identifier.into(),
            frequency,
            collection_method: CollectionMethod::Api,
        }
    }

    /// Whether the orchestrator collects this row at all.
    pub fn is_collectable(&self) -> bool {
        self.collection_method.is_api() && self.source.supports(self.frequency)
    }
}
