// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory resource with failure injection.
//!
//! `MockResource` holds a list of `u64` records. Transactions append to it
//! and roll back on failure. It contains an `Rc`, so it is neither `Send`
//! nor `Sync`: a test that compiles against it shows the worker never
//! moves its resource across threads.

use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use keeper_core::{BoxError, LocatableConfig, Resource};
use tracing::debug;

use crate::recorder::Recorder;

/// How to "open" a [`MockResource`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockConfig {
    /// Label only; nothing is read from disk.
    pub location: Option<PathBuf>,
    /// Records present right after open.
    pub seed: Vec<u64>,
    /// When set, `open` fails with this message.
    pub fail_open: Option<String>,
    /// When set, `open` panics.
    pub panic_on_open: bool,
    /// Sleep this long inside `open`, to keep the worker in `Opening`.
    pub open_delay: Duration,
    /// Number of leading refresh calls that fail.
    pub refresh_failures: usize,
    /// When set, `close` fails.
    pub fail_close: bool,
    /// Shared recorder.
    pub recorder: Recorder,
}

impl MockConfig {
    /// A config that opens successfully, recording into `recorder`.
    pub fn with_recorder(recorder: Recorder) -> Self {
        Self {
            recorder,
            ..Self::default()
        }
    }

    /// A config whose open fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_open: Some(message.into()),
            ..Self::default()
        }
    }
}

impl LocatableConfig for MockConfig {
    fn with_location(self, path: PathBuf) -> Self {
        Self {
            location: Some(path),
            ..self
        }
    }

    fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }
}

/// In-memory, single-thread resource.
#[derive(Debug)]
pub struct MockResource {
    config: MockConfig,
    records: Vec<u64>,
    refresh_failures_left: usize,
    _not_send: PhantomData<Rc<()>>,
}

impl MockResource {
    /// Appends a record. Only durable if the surrounding transaction commits.
    pub fn push(&mut self, value: u64) {
        self.records.push(value);
    }

    /// Current records, including uncommitted ones inside a transaction.
    pub fn records(&self) -> &[u64] {
        &self.records
    }

    /// The configuration this resource was opened with.
    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    /// Makes the next refresh fail.
    pub fn fail_next_refresh(&mut self) {
        self.refresh_failures_left += 1;
    }
}

impl Resource for MockResource {
    type Config = MockConfig;

    fn open(config: &MockConfig) -> Result<Self, BoxError> {
        if !config.open_delay.is_zero() {
            std::thread::sleep(config.open_delay);
        }
        if config.panic_on_open {
            panic!("mock open panicked");
        }
        if let Some(message) = &config.fail_open {
            return Err(message.clone().into());
        }
        config.recorder.opened();
        debug!(location = ?config.location, "mock resource opened");
        Ok(Self {
            config: config.clone(),
            records: config.seed.clone(),
            refresh_failures_left: config.refresh_failures,
            _not_send: PhantomData,
        })
    }

    fn refresh(&mut self) -> Result<(), BoxError> {
        self.config.recorder.refreshed();
        if self.refresh_failures_left > 0 {
            self.refresh_failures_left -= 1;
            return Err("mock refresh failed".into());
        }
        Ok(())
    }

    fn transact<T, F>(&mut self, body: F) -> Result<T, BoxError>
    where
        F: FnOnce(&mut Self) -> Result<T, BoxError>,
    {
        let mark = self.records.len();
        let recorder = self.config.recorder.clone();
        let _active = recorder.enter();

        let result = match panic::catch_unwind(AssertUnwindSafe(|| body(self))) {
            Ok(result) => result,
            Err(payload) => {
                self.records.truncate(mark);
                panic::resume_unwind(payload);
            }
        };
        match &result {
            Ok(_) => recorder.commit(self.records.get(mark..).unwrap_or_default()),
            Err(_) => self.records.truncate(mark),
        }
        result
    }

    fn is_empty(&self) -> Result<bool, BoxError> {
        Ok(self.records.is_empty())
    }

    fn close(self) -> Result<(), BoxError> {
        self.config.recorder.closed();
        if self.config.fail_close {
            return Err("mock close failed".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transact_commits_and_records_order() {
        let recorder = Recorder::new();
        let mut resource = MockResource::open(&MockConfig::with_recorder(recorder.clone())).unwrap();
        resource
            .transact(|r| {
                r.push(1);
                r.push(2);
                Ok(())
            })
            .unwrap();
        let log = recorder.snapshot();
        assert_eq!(log.committed, vec![1, 2]);
        assert_eq!(log.max_active, 1);
        assert_eq!(log.active, 0);
    }

    #[test]
    fn failed_transaction_is_rolled_back() {
        let mut resource = MockResource::open(&MockConfig {
            seed: vec![7],
            ..MockConfig::default()
        })
        .unwrap();
        let result: Result<(), _> = resource.transact(|r| {
            r.push(8);
            Err("nope".into())
        });
        assert!(result.is_err());
        assert_eq!(resource.records(), &[7]);
        assert!(!resource.is_empty().unwrap());
    }

    #[test]
    fn panicking_transaction_is_rolled_back() {
        let recorder = Recorder::new();
        let mut resource = MockResource::open(&MockConfig {
            seed: vec![7],
            recorder: recorder.clone(),
            ..MockConfig::default()
        })
        .unwrap();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let _: Result<(), _> = resource.transact(|r| {
                r.push(8);
                panic!("body panicked");
            });
        }));
        assert!(outcome.is_err());
        assert_eq!(resource.records(), &[7]);
        let log = recorder.snapshot();
        assert!(log.committed.is_empty());
        assert_eq!(log.active, 0);
    }

    #[test]
    fn refresh_failures_are_counted_down() {
        let recorder = Recorder::new();
        let mut resource = MockResource::open(&MockConfig {
            refresh_failures: 1,
            recorder: recorder.clone(),
            ..MockConfig::default()
        })
        .unwrap();
        assert!(resource.refresh().is_err());
        assert!(resource.refresh().is_ok());
        resource.fail_next_refresh();
        assert!(resource.refresh().is_err());
        assert_eq!(recorder.snapshot().refreshes, 3);
    }

    #[test]
    fn failing_open_reports_message() {
        let err = MockResource::open(&MockConfig::failing("locked")).unwrap_err();
        assert_eq!(err.to_string(), "locked");
    }

    #[test]
    fn location_is_replaceable() {
        let config = MockConfig::default().with_location(PathBuf::from("/data/a"));
        assert_eq!(config.location(), Some(Path::new("/data/a")));
    }
}
