//! Shared helpers for integration tests: fixture loading, a scripted
//! transport and a sleeper that records instead of waiting.

#![allow(dead_code)]

use macrolab_core::data::{DataError, Fetcher, RetryPolicy, Sleeper, Transport};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture_dir().join(name)).unwrap()
}

type Handler = dyn Fn(&str) -> Result<Vec<u8>, DataError> + Send + Sync;

/// Transport whose responses come from a closure. Every locator read is
/// recorded in call order.
pub struct ScriptedTransport {
    handler: Box<Handler>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(handler: impl Fn(&str) -> Result<Vec<u8>, DataError> + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    fn read(&self, locator: &str) -> Result<Vec<u8>, DataError> {
        self.calls.lock().unwrap().push(locator.to_string());
        (self.handler)(locator)
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    pub waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}

/// Default retry policy, but sleeping into a recorder.
pub fn fetcher(transport: Arc<ScriptedTransport>) -> (Fetcher, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let fetcher = Fetcher::new(transport, RetryPolicy::default()).with_sleeper(sleeper.clone());
    (fetcher, sleeper)
}

pub fn not_found(locator: &str) -> DataError {
    DataError::HttpStatus {
        status: 404,
        locator: locator.to_string(),
    }
}
