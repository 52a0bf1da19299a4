//! Collector configuration, loaded from TOML.
//!
//! Every field is optional; a missing file section falls back to the
//! defaults below, so an empty file is a valid configuration.

use crate::data::error::DataError;
use crate::data::fetcher::RetryPolicy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What the orchestrator does when one series fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure and keep collecting the remaining series.
    #[default]
    Isolate,
    /// Abort the run on the first failed series.
    FailFast,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            backoff_secs: policy.backoff.as_secs(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(Duration::from_secs(self.backoff_secs), self.max_attempts)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            user_agent: format!("macrolab/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SgsConfig {
    /// Fail the series when any daily window exhausts its retries.
    pub require_all_windows: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Observations dated before this are dropped during harmonization.
    pub min_date: NaiveDate,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("dados"),
            min_date: default_start(),
        }
    }
}

/// Top-level configuration of a collection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// First day requested from every source.
    pub start_date: NaiveDate,
    /// Months past today used as the end of the requested span.
    pub horizon_months: u32,
    /// Window length for daily SGS downloads; 0 disables splitting.
    pub window_years: u32,
    pub failure_policy: FailurePolicy,
    pub retry: RetryConfig,
    pub http: HttpConfig,
    pub sgs: SgsConfig,
    pub output: OutputConfig,
}

/// Upper bound for `window_years`.
pub const MAX_WINDOW_YEARS: u32 = 100;
/// Upper bound for `horizon_months` (100 years).
pub const MAX_HORIZON_MONTHS: u32 = 1200;

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            start_date: default_start(),
            horizon_months: 36,
            window_years: crate::data::split::DEFAULT_SPAN_YEARS,
            failure_policy: FailurePolicy::default(),
            retry: RetryConfig::default(),
            http: HttpConfig::default(),
            sgs: SgsConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl CollectorConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DataError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, DataError> {
        let config: Self =
            toml::from_str(content).map_err(|e| DataError::Config(format!("parse TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DataError> {
        if self.retry.max_attempts == 0 {
            return Err(DataError::Config("retry.max_attempts must be at least 1".into()));
        }
        if self.http.timeout_secs == 0 {
            return Err(DataError::Config("http.timeout_secs must be positive".into()));
        }
        if self.window_years > MAX_WINDOW_YEARS {
            return Err(DataError::Config(format!(
                "window_years must be at most {MAX_WINDOW_YEARS}, got {}",
                self.window_years
            )));
        }
        if self.horizon_months > MAX_HORIZON_MONTHS {
            return Err(DataError::Config(format!(
                "horizon_months must be at most {MAX_HORIZON_MONTHS}, got {}",
                self.horizon_months
            )));
        }
        Ok(())
    }
}

fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = CollectorConfig::from_toml("").unwrap();
        assert_eq!(config, CollectorConfig::default());
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        assert_eq!(config.horizon_months, 36);
        assert_eq!(config.window_years, 5);
        assert_eq!(config.failure_policy, FailurePolicy::Isolate);
        assert_eq!(config.retry.policy(), RetryPolicy::default());
        assert_eq!(config.output.dir, PathBuf::from("dados"));
        assert!(!config.sgs.require_all_windows);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = CollectorConfig::from_toml(
            r#"
            start_date = "1995-01-01"
            failure_policy = "fail_fast"

            [retry]
            backoff_secs = 0

            [sgs]
            require_all_windows = true
            "#,
        )
        .unwrap();
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(1995, 1, 1).unwrap());
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.policy().backoff, Duration::ZERO);
        assert!(config.sgs.require_all_windows);
        assert_eq!(config.http.timeout_secs, 60);
    }

    #[test]
    fn rejects_zero_attempts_and_bad_values() {
        assert!(matches!(
            CollectorConfig::from_toml("[retry]\nmax_attempts = 0\n"),
            Err(DataError::Config(_))
        ));
        assert!(CollectorConfig::from_toml("failure_policy = \"sometimes\"").is_err());
        assert!(CollectorConfig::from_toml("start_date = \"01/01/2000\"").is_err());
    }

    #[test]
    fn rejects_out_of_range_windows_and_horizons() {
        assert!(matches!(
            CollectorConfig::from_toml("window_years = 300000\n"),
            Err(DataError::Config(_))
        ));
        assert!(matches!(
            CollectorConfig::from_toml("horizon_months = 4294967295\n"),
            Err(DataError::Config(_))
        ));
        let config = CollectorConfig::from_toml("window_years = 100\nhorizon_months = 1200\n").unwrap();
        assert_eq!(config.window_years, MAX_WINDOW_YEARS);
        assert_eq!(config.horizon_months, MAX_HORIZON_MONTHS);
    }
}
