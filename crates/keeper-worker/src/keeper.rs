// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Default configuration plus a shared default worker.
//!
//! A [`Keeper`] is the explicit replacement for process-wide state: hold one
//! (in an `Arc`, a `static`, or an application context) and every worker it
//! spawns falls back to its default configuration.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use keeper_config::{DefaultConfig, KeeperSettings};
use keeper_core::{BoxError, KeeperError, LocatableConfig, Resource, WorkerState};
use tracing::{debug, info, warn};

use crate::worker::{ResourceWorker, WorkerOptions};

/// Spawns workers against a shared default configuration and owns the
/// lazily created default worker.
pub struct Keeper<R: Resource> {
    defaults: Arc<DefaultConfig<R::Config>>,
    options: WorkerOptions,
    default_worker: Mutex<Option<ResourceWorker<R>>>,
}

impl<R: Resource> Default for Keeper<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> Keeper<R> {
    /// A keeper with no default configuration.
    pub fn new() -> Self {
        Self::with_options(WorkerOptions::default(), Arc::new(DefaultConfig::new()))
    }

    /// A keeper whose default configuration is `config`.
    pub fn with_default_config(config: R::Config) -> Self {
        Self::with_options(WorkerOptions::default(), Arc::new(DefaultConfig::with(config)))
    }

    /// A keeper sharing an existing default-configuration holder.
    pub fn with_options(options: WorkerOptions, defaults: Arc<DefaultConfig<R::Config>>) -> Self {
        Self {
            defaults,
            options,
            default_worker: Mutex::new(None),
        }
    }

    /// The default-configuration holder workers fall back to.
    pub fn defaults(&self) -> &Arc<DefaultConfig<R::Config>> {
        &self.defaults
    }

    /// The current default configuration.
    pub fn default_config(&self) -> Option<R::Config> {
        self.defaults.get()
    }

    /// Replaces the default configuration.
    ///
    /// The shared default worker, if any, is released so the next
    /// submission opens a fresh one with the new configuration. It still
    /// drains the tasks it already accepted.
    pub fn set_default_config(&self, config: Option<R::Config>) {
        self.defaults.set(config);
        if let Some(previous) = self.lock_default_worker().take() {
            debug!(worker = %previous.id(), "default configuration changed, releasing default worker");
        }
    }

    /// Spawns a worker for `config`, falling back to the default configuration.
    pub fn spawn<F>(&self, config: Option<R::Config>, on_ready: F) -> Result<ResourceWorker<R>, KeeperError>
    where
        F: for<'a> FnOnce(Result<&'a mut R, &'a KeeperError>) + Send + 'static,
    {
        ResourceWorker::spawn_with(&self.options, config, &self.defaults, on_ready)
    }

    /// Spawns a worker for the default configuration.
    pub fn spawn_default<F>(&self, on_ready: F) -> Result<ResourceWorker<R>, KeeperError>
    where
        F: for<'a> FnOnce(Result<&'a mut R, &'a KeeperError>) + Send + 'static,
    {
        self.spawn(None, on_ready)
    }

    /// Returns the shared default worker, spawning it on first use.
    ///
    /// A default worker that failed with [`KeeperError::NoConfiguration`] is
    /// replaced once a default configuration has been set; one that was
    /// disposed is always replaced.
    pub fn default_worker(&self) -> Result<ResourceWorker<R>, KeeperError> {
        let mut slot = self.lock_default_worker();

        if let Some(worker) = slot.as_ref() {
            let stale = match worker.state() {
                WorkerState::Disposed => true,
                WorkerState::Failed => {
                    matches!(worker.open_error(), Some(KeeperError::NoConfiguration))
                        && self.defaults.is_set()
                }
                WorkerState::Opening | WorkerState::Ready => false,
            };
            if !stale {
                return Ok(worker.clone());
            }
            debug!(worker = %worker.id(), "replacing stale default worker");
        }

        let worker = self.spawn(None, |outcome: Result<&mut R, &KeeperError>| match outcome {
            Ok(_) => info!("default worker ready"),
            Err(e) => warn!(error = %e, "default worker failed to open"),
        })?;
        *slot = Some(worker.clone());
        Ok(worker)
    }

    /// Submits a write task to the shared default worker.
    ///
    /// If the default worker cannot be spawned, `on_complete` receives the
    /// error on the calling thread.
    pub fn submit<T, F, C>(&self, task: F, on_complete: C)
    where
        T: Send + 'static,
        F: FnOnce(&mut R) -> Result<T, BoxError> + Send + 'static,
        C: FnOnce(Result<T, KeeperError>) + Send + 'static,
    {
        match self.default_worker() {
            Ok(worker) => worker.submit(task, on_complete),
            Err(e) => on_complete(Err(e)),
        }
    }

    /// Submits a write task to the shared default worker and waits for it.
    pub async fn transact<T, F>(&self, task: F) -> Result<T, KeeperError>
    where
        T: Send + 'static,
        F: FnOnce(&mut R) -> Result<T, BoxError> + Send + 'static,
    {
        self.default_worker()?.transact(task).await
    }

    /// Runs one transaction on a throwaway worker.
    ///
    /// Opens `config` (or the default configuration) on a fresh thread, runs
    /// `task`, closes the worker, and returns the task's outcome. A close
    /// failure is reported only when the task itself succeeded.
    pub async fn write_once<T, F>(&self, config: Option<R::Config>, task: F) -> Result<T, KeeperError>
    where
        T: Send + 'static,
        F: FnOnce(&mut R) -> Result<T, BoxError> + Send + 'static,
    {
        let worker = self.spawn(config, |_| {})?;
        let outcome = worker.transact(task).await;
        let closed = worker.close().await;
        let value = outcome?;
        closed?;
        Ok(value)
    }

    /// Closes the shared default worker, draining its queue.
    pub async fn close_default_worker(&self) -> Result<(), KeeperError> {
        let worker = self.lock_default_worker().take();
        match worker {
            Some(worker) => worker.close().await,
            None => Ok(()),
        }
    }

    fn lock_default_worker(&self) -> std::sync::MutexGuard<'_, Option<ResourceWorker<R>>> {
        self.default_worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R> Keeper<R>
where
    R: Resource,
    R::Config: LocatableConfig,
{
    /// Spawns a worker for the resource at `path`.
    ///
    /// The location replaces the one in the default configuration, or in
    /// `R::Config::default()` when no default is set.
    pub fn spawn_at<F>(&self, path: impl Into<PathBuf>, on_ready: F) -> Result<ResourceWorker<R>, KeeperError>
    where
        F: for<'a> FnOnce(Result<&'a mut R, &'a KeeperError>) + Send + 'static,
    {
        self.spawn(Some(self.config_at(path.into())), on_ready)
    }

    /// [`write_once`](Self::write_once) against the resource at `path`,
    /// resolving the configuration the way [`spawn_at`](Self::spawn_at) does.
    pub async fn write_once_at<T, F>(&self, path: impl Into<PathBuf>, task: F) -> Result<T, KeeperError>
    where
        T: Send + 'static,
        F: FnOnce(&mut R) -> Result<T, BoxError> + Send + 'static,
    {
        let config = self.config_at(path.into());
        self.write_once(Some(config), task).await
    }

    fn config_at(&self, path: PathBuf) -> R::Config {
        self.defaults.get().unwrap_or_default().with_location(path)
    }
}

impl<R> Keeper<R>
where
    R: Resource<Config = keeper_config::SqliteConfig>,
{
    /// A keeper configured from loaded settings: the `[sqlite]` section
    /// becomes the default configuration and `[worker]` the worker options.
    pub fn from_settings(settings: &KeeperSettings) -> Self {
        Self::with_options(
            WorkerOptions::from(&settings.worker),
            Arc::new(DefaultConfig::with(settings.sqlite.clone())),
        )
    }
}
