// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator contract for the resource a worker owns.

use crate::error::BoxError;

/// A stateful handle that is not safe for concurrent access.
///
/// A worker calls [`open`](Resource::open) on its own thread and never moves
/// the value to another thread afterwards, so implementations need not be
/// `Send` or `Sync`. Only the configuration crosses threads.
pub trait Resource: Sized + 'static {
    /// Immutable description of how to open the resource.
    type Config: Clone + Send + Sync + 'static;

    /// Opens a new handle.
    fn open(config: &Self::Config) -> Result<Self, BoxError>;

    /// Brings the handle up to date before a transaction starts.
    fn refresh(&mut self) -> Result<(), BoxError>;

    /// Runs `body` inside one atomic transaction.
    ///
    /// Implementations commit when `body` returns `Ok` and roll back when it
    /// returns `Err`.
    fn transact<T, F>(&mut self, body: F) -> Result<T, BoxError>
    where
        F: FnOnce(&mut Self) -> Result<T, BoxError>;

    /// Returns `true` when the resource holds no records.
    fn is_empty(&self) -> Result<bool, BoxError>;

    /// Releases the handle. Called once, on the owning thread, during disposal.
    fn close(self) -> Result<(), BoxError> {
        Ok(())
    }
}
