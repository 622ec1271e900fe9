// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared recorder observed from outside the worker thread.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

/// Snapshot of everything a [`Recorder`] has seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecorderLog {
    /// Name of the thread that opened the resource.
    pub opened_on: Option<String>,
    /// Number of successful opens.
    pub opens: usize,
    /// Names of the threads transactions ran on, in order.
    pub transaction_threads: Vec<String>,
    /// Transactions currently inside their body.
    pub active: usize,
    /// Highest value `active` ever reached.
    pub max_active: usize,
    /// Values committed by transactions, in commit order.
    pub committed: Vec<u64>,
    /// Number of refresh calls, successful or not.
    pub refreshes: usize,
    /// Number of close calls.
    pub closes: usize,
    /// Name of the thread that closed the resource.
    pub closed_on: Option<String>,
}

/// Cheaply cloneable handle to a shared [`RecorderLog`].
///
/// Put one in a [`MockConfig`](crate::MockConfig), keep a clone in the test,
/// and read it back with [`snapshot`](Recorder::snapshot).
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    log: Arc<Mutex<RecorderLog>>,
}

impl PartialEq for Recorder {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.log, &other.log)
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the current log.
    pub fn snapshot(&self) -> RecorderLog {
        self.with(|log| log.clone())
    }

    pub(crate) fn opened(&self) {
        self.with(|log| {
            log.opens += 1;
            log.opened_on = Some(current_thread_name());
        });
    }

    pub(crate) fn refreshed(&self) {
        self.with(|log| log.refreshes += 1);
    }

    /// Marks a transaction body as running until the guard drops, even if
    /// the body panics.
    pub(crate) fn enter(&self) -> ActiveGuard<'_> {
        self.with(|log| {
            log.transaction_threads.push(current_thread_name());
            log.active += 1;
            log.max_active = log.max_active.max(log.active);
        });
        ActiveGuard { recorder: self }
    }

    pub(crate) fn commit(&self, values: &[u64]) {
        self.with(|log| log.committed.extend_from_slice(values));
    }

    pub(crate) fn closed(&self) {
        self.with(|log| {
            log.closes += 1;
            log.closed_on = Some(current_thread_name());
        });
    }

    fn with<T>(&self, f: impl FnOnce(&mut RecorderLog) -> T) -> T {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut log)
    }
}

pub(crate) struct ActiveGuard<'a> {
    recorder: &'a Recorder,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.recorder.with(|log| log.active -= 1);
    }
}

/// Name of the current thread, or `"<unnamed>"`.
pub fn current_thread_name() -> String {
    thread::current()
        .name()
        .unwrap_or("<unnamed>")
        .to_string()
}
