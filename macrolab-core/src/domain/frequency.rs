//! Frequency buckets and calendar normalization.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sampling frequency of a series. Also the grouping key of the collection
/// output: every series lands in the bucket of its frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Frequency {
    Daily,
    Monthly,
    Quarterly,
    Annual,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::Daily,
        Frequency::Monthly,
        Frequency::Quarterly,
        Frequency::Annual,
    ];

    /// Parse a metadata label (`Diária`, `Mensal`, `Trimestral`, `Anual`).
    ///
    /// Matching ignores case and Portuguese accents; English names are
    /// accepted too.
    pub fn from_label(label: &str) -> Option<Self> {
        match fold_label(label).as_str() {
            "diaria" | "daily" => Some(Self::Daily),
            "mensal" | "monthly" => Some(Self::Monthly),
            "trimestral" | "quarterly" => Some(Self::Quarterly),
            "anual" | "annual" => Some(Self::Annual),
            _ => None,
        }
    }

    /// Label as written in the metadata table.
    pub fn label(self) -> &'static str {
        match self {
            Self::Daily => "Diária",
            Self::Monthly => "Mensal",
            Self::Quarterly => "Trimestral",
            Self::Annual => "Anual",
        }
    }

    /// File stem of the harmonized table for this bucket.
    pub fn file_stem(self) -> &'static str {
        match self {
            Self::Daily => "df_diaria",
            Self::Monthly => "df_mensal",
            Self::Quarterly => "df_trimestral",
            Self::Annual => "df_anual",
        }
    }

    /// First calendar day of the period containing `date`.
    pub fn period_start(self, date: NaiveDate) -> NaiveDate {
        let (year, month) = match self {
            Self::Daily => return date,
            Self::Monthly => (date.year(), date.month()),
            Self::Quarterly => (date.year(), (date.month0() / 3) * 3 + 1),
            Self::Annual => (date.year(), 1),
        };
        // Day 1 exists for every valid year/month pair.
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lowercase and strip the accents that appear in the metadata labels.
pub(crate) fn fold_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}
