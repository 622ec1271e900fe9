// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Body of a worker thread: open, then serve the queue until disposal.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use keeper_config::DefaultConfig;
use keeper_core::{KeeperError, Resource, WorkerState};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::queue::{panic_message, Command};
use crate::worker::Shared;

/// Ready callback: runs once on the worker thread with the open resource or
/// the reason it could not be opened.
pub type OnReady<R> = Box<dyn for<'a> FnOnce(Result<&'a mut R, &'a KeeperError>) + Send>;

/// Everything the worker thread needs, moved in at spawn time.
pub(crate) struct Runner<R: Resource> {
    pub(crate) shared: Arc<Shared<R::Config>>,
    pub(crate) explicit: Option<R::Config>,
    pub(crate) defaults: Arc<DefaultConfig<R::Config>>,
    pub(crate) on_ready: OnReady<R>,
    pub(crate) rx: mpsc::UnboundedReceiver<Command<R>>,
}

impl<R: Resource> Runner<R> {
    pub(crate) fn run(self) {
        let Runner {
            shared,
            explicit,
            defaults,
            on_ready,
            mut rx,
        } = self;
        let worker = shared.id;

        let mut resource = match open::<R>(&shared, explicit, &defaults) {
            Ok(resource) => {
                shared.set_state(WorkerState::Ready, None);
                info!(%worker, "resource opened");
                let mut resource = resource;
                notify_ready(worker, on_ready, Ok(&mut resource));
                Some(resource)
            }
            Err(err) => {
                warn!(%worker, error = %err, "resource failed to open");
                shared.set_state(WorkerState::Failed, Some(err.clone()));
                notify_ready(worker, on_ready, Err(&err));
                None
            }
        };

        let ack = loop {
            let Some(command) = rx.blocking_recv() else {
                debug!(%worker, "all handles dropped");
                break None;
            };
            match command {
                Command::Run(job) => {
                    let seq = job.seq();
                    let slot = match resource.as_mut() {
                        Some(resource) => Ok(resource),
                        None => Err(shared.stored_error()),
                    };
                    debug!(%worker, seq, "running task");
                    // Callbacks are user code; a panic in one must not take
                    // the queue down with it.
                    if let Err(payload) =
                        panic::catch_unwind(AssertUnwindSafe(|| job.complete(slot)))
                    {
                        error!(
                            %worker,
                            seq,
                            panic = %panic_message(payload.as_ref()),
                            "completion callback panicked"
                        );
                    }
                }
                Command::Close(ack) => {
                    debug!(%worker, "close requested");
                    break Some(ack);
                }
            }
        };

        // Nothing sent after this point will be accepted; whatever slipped in
        // before is failed as `Disposed` when the receiver drops the jobs.
        rx.close();
        shared.set_state(WorkerState::Disposed, None);

        let closed = match resource.take() {
            Some(resource) => match panic::catch_unwind(AssertUnwindSafe(|| resource.close())) {
                Ok(result) => result.map_err(KeeperError::generic),
                Err(payload) => Err(KeeperError::generic(format!(
                    "close panicked: {}",
                    panic_message(payload.as_ref())
                ))),
            },
            None => Ok(()),
        };
        if let Err(ref e) = closed {
            warn!(%worker, error = %e, "resource close failed");
        }
        drop(rx);
        info!(%worker, "worker disposed");

        if let Some(Some(ack)) = ack {
            let _ = ack.send(closed);
        }
        shared.notify_disposed();
    }
}

fn open<R: Resource>(
    shared: &Shared<R::Config>,
    explicit: Option<R::Config>,
    defaults: &DefaultConfig<R::Config>,
) -> Result<R, KeeperError> {
    let config = defaults
        .resolve(explicit)
        .ok_or(KeeperError::NoConfiguration)?;
    shared.set_configuration(config.clone());

    match panic::catch_unwind(AssertUnwindSafe(|| R::open(&config))) {
        Ok(result) => result.map_err(KeeperError::open),
        Err(payload) => Err(KeeperError::open(format!(
            "open panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn notify_ready<R>(
    worker: keeper_core::WorkerId,
    on_ready: OnReady<R>,
    outcome: Result<&mut R, &KeeperError>,
) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| on_ready(outcome))) {
        error!(
            %worker,
            panic = %panic_message(payload.as_ref()),
            "ready callback panicked"
        );
    }
}
