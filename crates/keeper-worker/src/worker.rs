// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A dedicated thread that owns one resource for its whole lifetime.
//!
//! The resource is opened on the worker thread and never leaves it. Other
//! threads reach it only through the worker's [`TransactionQueue`].
//!
//! Shutdown is drain-then-dispose: [`ResourceWorker::close`] lets every task
//! submitted before it finish, then closes the resource and ends the thread.
//! Dropping the last handle does the same without waiting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use arc_swap::ArcSwap;
use keeper_config::{DefaultConfig, WorkerSettings};
use keeper_core::{BoxError, KeeperError, Resource, WorkerId, WorkerState};
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};

use crate::queue::TransactionQueue;
use crate::runner::Runner;

static NEXT_WORKER_ID: AtomicU64 = AtomicU64::new(1);

/// Tunables for spawning a worker.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Thread name prefix; the worker id is appended.
    pub thread_name: String,
    /// How long [`ResourceWorker::close`] waits for the queue to drain.
    pub close_timeout: Duration,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        WorkerOptions::from(&WorkerSettings::default())
    }
}

impl From<&WorkerSettings> for WorkerOptions {
    fn from(settings: &WorkerSettings) -> Self {
        Self {
            thread_name: settings.thread_name.clone(),
            close_timeout: settings.close_timeout(),
        }
    }
}

struct Status {
    state: WorkerState,
    error: Option<KeeperError>,
}

/// State visible from both the worker thread and its handles.
pub(crate) struct Shared<C> {
    pub(crate) id: WorkerId,
    status: ArcSwap<Status>,
    configuration: OnceLock<C>,
    thread_id: OnceLock<ThreadId>,
    thread: Mutex<Option<JoinHandle<()>>>,
    disposed: watch::Sender<bool>,
}

impl<C> Shared<C> {
    fn new(id: WorkerId) -> Self {
        Self {
            id,
            status: ArcSwap::from_pointee(Status {
                state: WorkerState::Opening,
                error: None,
            }),
            configuration: OnceLock::new(),
            thread_id: OnceLock::new(),
            thread: Mutex::new(None),
            disposed: watch::Sender::new(false),
        }
    }

    pub(crate) fn set_state(&self, state: WorkerState, error: Option<KeeperError>) {
        debug!(worker = %self.id, %state, "state change");
        self.status.store(Arc::new(Status { state, error }));
    }

    pub(crate) fn state(&self) -> WorkerState {
        self.status.load().state
    }

    /// The error a task must complete with when no resource is available.
    pub(crate) fn stored_error(&self) -> KeeperError {
        let status = self.status.load();
        match (&status.state, &status.error) {
            (WorkerState::Failed, Some(error)) => error.clone(),
            _ => KeeperError::Disposed,
        }
    }

    pub(crate) fn set_configuration(&self, config: C) {
        let _ = self.configuration.set(config);
    }

    pub(crate) fn bind_current_thread(&self) {
        let _ = self.thread_id.set(thread::current().id());
    }

    fn is_current_thread(&self) -> bool {
        self.thread_id.get() == Some(&thread::current().id())
    }

    fn take_thread(&self) -> Option<JoinHandle<()>> {
        self.thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub(crate) fn notify_disposed(&self) {
        self.disposed.send_replace(true);
    }
}

/// Handle to a worker thread owning one `R`.
///
/// Cloning is cheap and every clone talks to the same thread.
///
/// # Threading
///
/// `R` itself never crosses threads, so it need not be `Send`. Do not try to
/// smuggle references to it out of a task: the borrow checker prevents it
/// for `&mut R`, and nothing in this crate makes `R` safe to read elsewhere.
pub struct ResourceWorker<R: Resource> {
    queue: TransactionQueue<R>,
    shared: Arc<Shared<R::Config>>,
    close_timeout: Duration,
}

impl<R: Resource> Clone for ResourceWorker<R> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            shared: self.shared.clone(),
            close_timeout: self.close_timeout,
        }
    }
}

impl<R: Resource> std::fmt::Debug for ResourceWorker<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceWorker")
            .field("id", &self.shared.id)
            .field("state", &self.state())
            .finish()
    }
}

impl<R: Resource> ResourceWorker<R> {
    /// Starts a worker thread with default [`WorkerOptions`].
    ///
    /// On the new thread the effective configuration is resolved (`config`,
    /// then `defaults`, else [`KeeperError::NoConfiguration`]) and the
    /// resource is opened. `on_ready` then runs exactly once, on that thread,
    /// with the open resource or the open error.
    ///
    /// Fails only if the OS refuses to create the thread; `on_ready` is not
    /// called in that case.
    pub fn spawn<F>(
        config: Option<R::Config>,
        defaults: &Arc<DefaultConfig<R::Config>>,
        on_ready: F,
    ) -> Result<Self, KeeperError>
    where
        F: for<'a> FnOnce(Result<&'a mut R, &'a KeeperError>) + Send + 'static,
    {
        Self::spawn_with(&WorkerOptions::default(), config, defaults, on_ready)
    }

    /// Starts a worker thread with explicit options.
    pub fn spawn_with<F>(
        options: &WorkerOptions,
        config: Option<R::Config>,
        defaults: &Arc<DefaultConfig<R::Config>>,
        on_ready: F,
    ) -> Result<Self, KeeperError>
    where
        F: for<'a> FnOnce(Result<&'a mut R, &'a KeeperError>) + Send + 'static,
    {
        let id = WorkerId(NEXT_WORKER_ID.fetch_add(1, Ordering::Relaxed));
        let shared = Arc::new(Shared::new(id));
        let (queue, rx) = TransactionQueue::channel();

        let runner = Runner {
            shared: shared.clone(),
            explicit: config,
            defaults: defaults.clone(),
            on_ready: Box::new(on_ready),
            rx,
        };

        let handle = thread::Builder::new()
            .name(format!("{}-{}", options.thread_name, id.0))
            .spawn(move || {
                runner.shared.bind_current_thread();
                runner.run();
            })
            .map_err(KeeperError::generic)?;
        *shared.thread.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        debug!(worker = %id, "worker spawned");

        Ok(Self {
            queue,
            shared,
            close_timeout: options.close_timeout,
        })
    }

    /// Starts a worker for an explicit configuration, without a ready callback.
    pub fn open(config: R::Config) -> Result<Self, KeeperError> {
        Self::spawn(Some(config), &Arc::new(DefaultConfig::new()), |_| {})
    }

    /// Process-unique identifier of this worker.
    pub fn id(&self) -> WorkerId {
        self.shared.id
    }

    /// Current lifecycle phase.
    pub fn state(&self) -> WorkerState {
        self.shared.state()
    }

    /// The configuration the resource was opened with, once resolved.
    pub fn configuration(&self) -> Option<R::Config> {
        self.shared.configuration.get().cloned()
    }

    /// The stored open error, if the worker is in [`WorkerState::Failed`].
    pub fn open_error(&self) -> Option<KeeperError> {
        match self.state() {
            WorkerState::Failed => Some(self.shared.stored_error()),
            _ => None,
        }
    }

    /// The queue feeding this worker.
    pub fn queue(&self) -> &TransactionQueue<R> {
        &self.queue
    }

    /// Submits a write task; see [`TransactionQueue::submit`].
    ///
    /// Once the worker is [`WorkerState::Failed`] the task is not queued:
    /// `on_complete` runs right away, on the calling thread, with the stored
    /// open error.
    pub fn submit<T, F, C>(&self, task: F, on_complete: C)
    where
        T: Send + 'static,
        F: FnOnce(&mut R) -> Result<T, BoxError> + Send + 'static,
        C: FnOnce(Result<T, KeeperError>) + Send + 'static,
    {
        if let Some(error) = self.open_error() {
            debug!(worker = %self.shared.id, "worker failed, rejecting task");
            on_complete(Err(error));
            return;
        }
        self.queue.submit(task, on_complete);
    }

    /// Submits a write task and waits for its outcome.
    pub async fn transact<T, F>(&self, task: F) -> Result<T, KeeperError>
    where
        T: Send + 'static,
        F: FnOnce(&mut R) -> Result<T, BoxError> + Send + 'static,
    {
        if let Some(error) = self.open_error() {
            return Err(error);
        }
        self.queue.transact(task).await
    }

    /// Waits until the open attempt has finished.
    ///
    /// Returns the stored open error if it failed.
    pub async fn ready(&self) -> Result<(), KeeperError> {
        self.queue
            .query(|_| Ok(()))
            .await
            .unwrap_or(Err(KeeperError::Disposed))
    }

    /// Whether the resource holds no records.
    ///
    /// Runs on the worker thread in queue order, so it observes every task
    /// submitted before it. Errors are surfaced rather than mapped to
    /// `false`: a failed worker returns its stored open error, a disposed
    /// one returns [`KeeperError::Disposed`], and a worker still opening is
    /// waited for.
    pub async fn is_empty(&self) -> Result<bool, KeeperError> {
        self.queue
            .query(|resource: &R| resource.is_empty())
            .await
            .unwrap_or(Err(KeeperError::Disposed))
    }

    /// Blocking form of [`is_empty`](Self::is_empty).
    ///
    /// Must not be called from inside an async runtime. Called from the
    /// worker's own thread it returns an error instead of deadlocking.
    pub fn is_empty_blocking(&self) -> Result<bool, KeeperError> {
        if self.shared.is_current_thread() {
            return Err(KeeperError::generic(
                "is_empty_blocking called on the worker's own thread",
            ));
        }
        self.queue
            .query(|resource: &R| resource.is_empty())
            .blocking_recv()
            .unwrap_or(Err(KeeperError::Disposed))
    }

    /// Drains the queue, closes the resource, and ends the thread.
    ///
    /// Tasks submitted before this call run to completion first; tasks
    /// submitted afterwards complete with [`KeeperError::Disposed`]. Returns
    /// [`KeeperError::Timeout`] if draining takes longer than the configured
    /// close timeout; the worker keeps draining in the background.
    ///
    /// # Panics
    ///
    /// Must be awaited inside a Tokio runtime with the time driver enabled,
    /// since the close timeout is a Tokio timer.
    pub async fn close(&self) -> Result<(), KeeperError> {
        let mut disposed = self.shared.disposed.subscribe();
        let (tx, rx) = oneshot::channel();
        let requested = self.queue.request_close(Some(tx));

        let wait = async move {
            if requested && let Ok(result) = rx.await {
                return result;
            }
            // Another handle is already closing this worker.
            let _ = disposed.wait_for(|done| *done).await;
            Ok(())
        };

        tokio::time::timeout(self.close_timeout, wait)
            .await
            .map_err(|_| KeeperError::Timeout {
                duration: self.close_timeout,
            })?
    }

    /// Blocking form of [`close`](Self::close). Waits without a timeout and
    /// joins the worker thread.
    ///
    /// Called from the worker's own thread (inside a task), it only schedules
    /// the close and returns.
    ///
    /// # Panics
    ///
    /// Panics if called from inside an async runtime context, where blocking
    /// on the close acknowledgement is not allowed. Use [`close`](Self::close)
    /// there instead.
    pub fn close_blocking(&self) -> Result<(), KeeperError> {
        if self.shared.is_current_thread() {
            self.queue.request_close(None);
            return Ok(());
        }

        let (tx, rx) = oneshot::channel();
        let result = if self.queue.request_close(Some(tx)) {
            rx.blocking_recv().unwrap_or(Ok(()))
        } else {
            Ok(())
        };

        if let Some(handle) = self.shared.take_thread()
            && handle.join().is_err()
        {
            warn!(worker = %self.shared.id, "worker thread panicked");
        }
        result
    }
}
