// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by workers and their observers.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle phase of a resource worker.
///
/// `Opening -> Ready | Failed -> Disposed`. `Failed` and `Disposed` are
/// terminal for transactions: every task submitted in those phases fails.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// The worker thread is resolving configuration and opening the resource.
    Opening,
    /// The resource is open and the queue is draining tasks.
    Ready,
    /// The open failed; the error is kept and replayed to every task.
    Failed,
    /// The resource is closed and the worker thread has exited.
    Disposed,
}

impl WorkerState {
    /// Returns `true` once the worker will never run another task.
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkerState::Failed | WorkerState::Disposed)
    }
}

/// Identifier for a worker, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub u64);

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}
