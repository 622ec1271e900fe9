// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background workers that each own one non-thread-safe resource.
//!
//! A [`ResourceWorker`] opens its resource on a dedicated thread and keeps it
//! there. Writes are submitted from any thread through the worker's
//! [`TransactionQueue`] and run one at a time, in submission order, each
//! inside its own transaction. Completion is delivered either to a callback
//! (on the worker thread) or to an awaiting future.
//!
//! [`Keeper`] adds a shared default configuration and a lazily spawned
//! default worker on top.
//!
//! ```no_run
//! # async fn demo() -> Result<(), keeper_core::KeeperError> {
//! use keeper_config::SqliteConfig;
//! use keeper_sqlite::SqliteResource;
//! use keeper_worker::Keeper;
//!
//! let keeper: Keeper<SqliteResource> =
//!     Keeper::with_default_config(SqliteConfig::at("/tmp/notes.db"));
//! keeper
//!     .transact(|db| {
//!         db.connection().execute("CREATE TABLE IF NOT EXISTS notes (body TEXT)", [])?;
//!         Ok(())
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod keeper;
mod queue;
mod runner;
mod worker;

pub use keeper::Keeper;
pub use queue::TransactionQueue;
pub use runner::OnReady;
pub use worker::{ResourceWorker, WorkerOptions};
