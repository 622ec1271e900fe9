// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serial transaction queue feeding a worker thread.
//!
//! Tasks travel to the worker thread over an unbounded channel, so
//! submission never blocks and delivery order equals submission order.
//! The worker thread pops one command at a time, which gives the
//! one-task-in-flight guarantee without any extra locking.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use keeper_core::{BoxError, KeeperError, Resource};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

/// What the worker thread hands a job: the open resource, or the error the
/// job must complete with instead.
pub(crate) type Slot<'a, R> = Result<&'a mut R, KeeperError>;

type JobFn<R> = Box<dyn for<'a> FnOnce(Slot<'a, R>) + Send>;

fn job_fn<R, F>(f: F) -> JobFn<R>
where
    F: for<'a> FnOnce(Slot<'a, R>) + Send + 'static,
{
    Box::new(f)
}

/// A type-erased unit of work that completes exactly once.
///
/// If the job is dropped without running (the worker thread went away),
/// it completes with [`KeeperError::Disposed`].
pub(crate) struct Job<R> {
    seq: u64,
    run: Option<JobFn<R>>,
}

impl<R> Job<R> {
    fn new(seq: u64, run: JobFn<R>) -> Self {
        Self {
            seq,
            run: Some(run),
        }
    }

    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }

    /// Runs the job against `slot`.
    pub(crate) fn complete(mut self, slot: Slot<'_, R>) {
        if let Some(run) = self.run.take() {
            run(slot);
        }
    }
}

impl<R> Drop for Job<R> {
    fn drop(&mut self) {
        if let Some(run) = self.run.take() {
            debug!(seq = self.seq, "job dropped before running");
            // A panicking callback must not abort the process from inside Drop.
            if let Err(payload) =
                panic::catch_unwind(AssertUnwindSafe(|| run(Err(KeeperError::Disposed))))
            {
                error!(
                    seq = self.seq,
                    panic = %panic_message(payload.as_ref()),
                    "completion callback panicked"
                );
            }
        }
    }
}

/// Messages understood by the worker thread.
pub(crate) enum Command<R> {
    /// Run a job in FIFO position.
    Run(Job<R>),
    /// Dispose after every earlier command has run. The sender, if any, is
    /// told once the resource is closed.
    Close(Option<oneshot::Sender<Result<(), KeeperError>>>),
}

/// Producer side of a worker's transaction queue.
///
/// Cheap to clone; every clone feeds the same worker. When the last clone
/// is dropped the worker drains what is queued and disposes itself.
pub struct TransactionQueue<R> {
    tx: mpsc::UnboundedSender<Command<R>>,
    seq: std::sync::Arc<std::sync::atomic::AtomicU64>,
}

impl<R> Clone for TransactionQueue<R> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            seq: self.seq.clone(),
        }
    }
}

impl<R: Resource> TransactionQueue<R> {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<Command<R>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue = Self {
            tx,
            seq: Default::default(),
        };
        (queue, rx)
    }

    /// Appends a write task.
    ///
    /// On the worker thread the resource is refreshed, then `task` runs
    /// inside [`Resource::transact`]. `on_complete` receives:
    /// - `Err(Refresh)` if the refresh failed (the task body never ran),
    /// - `Err(Generic)` if the body or the commit failed, or the body panicked,
    /// - the worker's stored open error if the worker failed to open,
    /// - `Ok(value)` otherwise.
    ///
    /// If the worker is already disposed, `on_complete` runs immediately on
    /// the calling thread with [`KeeperError::Disposed`].
    pub fn submit<T, F, C>(&self, task: F, on_complete: C)
    where
        T: Send + 'static,
        F: FnOnce(&mut R) -> Result<T, BoxError> + Send + 'static,
        C: FnOnce(Result<T, KeeperError>) + Send + 'static,
    {
        self.push(job_fn(move |slot| {
            let result = slot.and_then(|resource| run_transaction(resource, task));
            on_complete(result);
        }));
    }

    /// Appends a write task and waits for its outcome.
    ///
    /// Same semantics as [`submit`](Self::submit).
    pub async fn transact<T, F>(&self, task: F) -> Result<T, KeeperError>
    where
        T: Send + 'static,
        F: FnOnce(&mut R) -> Result<T, BoxError> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.submit(task, move |result| {
            let _ = tx.send(result);
        });
        // A job always completes, so the sender is only dropped on disposal.
        rx.await.unwrap_or(Err(KeeperError::Disposed))
    }

    /// Appends a read-only query that runs outside any transaction.
    pub(crate) fn query<T, F>(&self, query: F) -> oneshot::Receiver<Result<T, KeeperError>>
    where
        T: Send + 'static,
        F: FnOnce(&R) -> Result<T, BoxError> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.push(job_fn(move |slot| {
            let result = slot.and_then(|resource| {
                match panic::catch_unwind(AssertUnwindSafe(|| query(resource))) {
                    Ok(result) => result.map_err(KeeperError::generic),
                    Err(payload) => Err(panicked(payload)),
                }
            });
            let _ = tx.send(result);
        }));
        rx
    }

    /// Asks the worker to dispose itself after the commands already queued.
    ///
    /// Returns `false` if the worker is already gone.
    pub(crate) fn request_close(
        &self,
        ack: Option<oneshot::Sender<Result<(), KeeperError>>>,
    ) -> bool {
        self.tx.send(Command::Close(ack)).is_ok()
    }

    /// Returns `true` once the worker thread has stopped accepting commands.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn push(&self, run: JobFn<R>) {
        let seq = self
            .seq
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let job = Job::new(seq, run);
        if let Err(mpsc::error::SendError(command)) = self.tx.send(Command::Run(job)) {
            // Dropping the job completes it with `Disposed` on this thread.
            debug!(seq, "worker disposed, rejecting task");
            drop(command);
        }
    }
}

/// Refresh, then run `task` inside one transaction.
pub(crate) fn run_transaction<R, T, F>(resource: &mut R, task: F) -> Result<T, KeeperError>
where
    R: Resource,
    F: FnOnce(&mut R) -> Result<T, BoxError>,
{
    if let Err(e) = resource.refresh() {
        warn!(error = %e, "refresh failed, skipping task");
        return Err(KeeperError::refresh(e));
    }

    match panic::catch_unwind(AssertUnwindSafe(|| resource.transact(task))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(KeeperError::generic(e)),
        Err(payload) => Err(panicked(payload)),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

pub(crate) fn panicked(payload: Box<dyn Any + Send>) -> KeeperError {
    KeeperError::generic(format!("task panicked: {}", panic_message(payload.as_ref())))
}
