//! Resilient fetcher: read + parse with bounded retries and a fixed backoff.
//!
//! Every attempt performs the full read and parse; a transport error, a
//! non-success status and a parse error all count as a failed attempt. The
//! first success returns immediately. When every attempt fails the fetcher
//! reports "no data" (`Fetched::value == None`) instead of an error, so the
//! caller decides how to escalate.

use super::error::DataError;
use super::transport::Transport;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Attempt limit and wait between attempts.
///
/// The backoff is constant: public endpoints rate-limit per request, and a
/// fixed wait keeps the worst-case failure time of a series predictable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Wait between two consecutive attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn fixed(backoff: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Attempts actually made; a zero limit still tries once.
    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Blocks the current thread between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// `std::thread::sleep`. The pipeline is sequential, so blocking is fine.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Record of one attempt.
#[derive(Debug, Clone)]
pub struct FetchAttempt {
    /// 1-based attempt number.
    pub attempt: u32,
    /// `None` for the successful attempt.
    pub error: Option<DataError>,
    /// Time slept after this attempt.
    pub waited: Duration,
}

/// Outcome of a fetch: the parsed value (if any attempt succeeded) and the
/// attempt log.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub value: Option<T>,
    pub attempts: Vec<FetchAttempt>,
}

impl<T> Fetched<T> {
    pub fn is_success(&self) -> bool {
        self.value.is_some()
    }

    pub fn failed_attempts(&self) -> usize {
        self.attempts.iter().filter(|a| a.error.is_some()).count()
    }

    pub fn total_wait(&self) -> Duration {
        self.attempts.iter().map(|a| a.waited).sum()
    }

    /// Last error seen, if any.
    pub fn last_error(&self) -> Option<&DataError> {
        self.attempts.iter().rev().find_map(|a| a.error.as_ref())
    }

    /// Turn the "no data" outcome into `DataError::NoData`.
    pub fn into_result(self, locator: &str) -> Result<T, DataError> {
        let attempts = self.attempts.len() as u32;
        self.value.ok_or_else(|| DataError::NoData {
            locator: locator.to_string(),
            attempts,
        })
    }
}

/// Retrying reader shared by every adapter.
///
/// Holds no mutable state; concurrent calls for independent locators are safe.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// Replace the sleeper (tests use one that records instead of waiting).
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Read `locator` and parse it, retrying on any failure.
    pub fn fetch<T, F>(&self, locator: &str, parse: F) -> Fetched<T>
    where
        F: Fn(&[u8]) -> Result<T, DataError>,
    {
        let max_attempts = self.policy.attempts();
        let mut attempts = Vec::with_capacity(max_attempts as usize);

        for attempt in 1..=max_attempts {
            match self
                .transport
                .read(locator)
                .and_then(|body| parse(&body))
            {
                Ok(value) => {
                    debug!(attempt, locator, transport = self.transport.name(), "fetch succeeded");
                    attempts.push(FetchAttempt {
                        attempt,
                        error: None,
                        waited: Duration::ZERO,
                    });
                    return Fetched {
                        value: Some(value),
                        attempts,
                    };
                }
                Err(e) => {
                    warn!(attempt, max_attempts, locator, error = %e, "fetch attempt failed");
                    let waited = if attempt < max_attempts {
                        self.sleeper.sleep(self.policy.backoff);
                        self.policy.backoff
                    } else {
                        Duration::ZERO
                    };
                    attempts.push(FetchAttempt {
                        attempt,
                        error: Some(e),
                        waited,
                    });
                }
            }
        }

        error!(locator, attempts = max_attempts, "fetch failed after all attempts");
        Fetched {
            value: None,
            attempts,
        }
    }
}
