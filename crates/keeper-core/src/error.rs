// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Keeper workers and transaction queues.

use std::sync::Arc;

use thiserror::Error;

/// Boxed error returned by [`Resource`](crate::Resource) implementations and task bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared, cloneable error source carried by [`KeeperError`] variants.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// The primary error type delivered to every open, query, and transaction callback.
///
/// Cloneable so a worker can replay its stored open error to every task
/// submitted after the open failed.
#[derive(Debug, Clone, Error)]
pub enum KeeperError {
    /// No explicit configuration was given and no default configuration is set.
    #[error("no configuration provided and no default configuration set")]
    NoConfiguration,

    /// The resource could not be opened with the resolved configuration.
    #[error("failed to open resource: {source}")]
    Open { source: SharedError },

    /// The pre-transaction refresh failed; the task body did not run.
    #[error("failed to refresh resource before transaction: {source}")]
    Refresh { source: SharedError },

    /// Any other failure, usually raised by the task body or the resource itself.
    #[error("transaction failed: {source}")]
    Generic { source: SharedError },

    /// The worker has been closed and no longer accepts work.
    #[error("worker has been disposed")]
    Disposed,

    /// Waiting on the worker took longer than allowed.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Settings could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    Config(String),
}

impl KeeperError {
    /// Wraps an open failure.
    pub fn open(source: impl Into<BoxError>) -> Self {
        KeeperError::Open {
            source: Arc::from(source.into()),
        }
    }

    /// Wraps a refresh failure.
    pub fn refresh(source: impl Into<BoxError>) -> Self {
        KeeperError::Refresh {
            source: Arc::from(source.into()),
        }
    }

    /// Wraps a task body or engine failure.
    pub fn generic(source: impl Into<BoxError>) -> Self {
        KeeperError::Generic {
            source: Arc::from(source.into()),
        }
    }

    /// Returns `true` for errors that end a worker's life: every later
    /// submission to the same worker fails the same way.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            KeeperError::NoConfiguration | KeeperError::Open { .. } | KeeperError::Disposed
        )
    }
}
