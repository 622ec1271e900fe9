// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Keeper worker tests.
//!
//! Provides an in-memory resource with failure injection, so worker and
//! queue behavior can be tested deterministically without touching disk.
//!
//! # Components
//!
//! - [`MockResource`] - in-memory resource that is deliberately `!Send`
//! - [`MockConfig`] - its configuration, with open/refresh/close failure switches
//! - [`Recorder`] - shared recorder of threads, concurrency, and commit order
//! - [`temp_sqlite_config`] - SQLite settings inside a fresh temp directory

pub mod mock_resource;
pub mod recorder;

pub use mock_resource::{MockConfig, MockResource};
pub use recorder::{Recorder, RecorderLog};

use keeper_config::SqliteConfig;
use tempfile::TempDir;

/// SQLite settings pointing at `name` inside a new temporary directory.
///
/// Keep the returned [`TempDir`] alive for as long as the database is used.
pub fn temp_sqlite_config(name: &str) -> std::io::Result<(TempDir, SqliteConfig)> {
    let dir = tempfile::tempdir()?;
    let config = SqliteConfig::at(dir.path().join(name));
    Ok((dir, config))
}
