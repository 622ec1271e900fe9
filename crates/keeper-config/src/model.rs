// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Settings model structs for Keeper.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! keys at startup, providing actionable error messages.

use std::path::{Path, PathBuf};

use keeper_core::LocatableConfig;
use serde::{Deserialize, Serialize};

/// Top-level Keeper settings.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeeperSettings {
    /// Worker thread settings.
    #[serde(default)]
    pub worker: WorkerSettings,

    /// SQLite resource settings.
    #[serde(default)]
    pub sqlite: SqliteConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogSettings,
}

/// Worker thread settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerSettings {
    /// Prefix for worker thread names. A per-process counter is appended.
    #[serde(default = "default_thread_name")]
    pub thread_name: String,

    /// How long `close` waits for queued tasks to drain, in milliseconds.
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            thread_name: default_thread_name(),
            close_timeout_ms: default_close_timeout_ms(),
        }
    }
}

impl WorkerSettings {
    /// The close timeout as a [`Duration`](std::time::Duration).
    pub fn close_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.close_timeout_ms)
    }
}

fn default_thread_name() -> String {
    "keeper-worker".to_string()
}

fn default_close_timeout_ms() -> u64 {
    5_000
}

/// How to open a SQLite-backed resource.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Enable WAL (Write-Ahead Logging) mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// How long SQLite waits on a locked database, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl SqliteConfig {
    /// Settings for a database at `path` with every other field defaulted.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: path.into(),
            ..Self::default()
        }
    }
}

impl LocatableConfig for SqliteConfig {
    fn with_location(self, path: PathBuf) -> Self {
        Self {
            database_path: path,
            ..self
        }
    }

    fn location(&self) -> Option<&Path> {
        Some(self.database_path.as_path())
    }
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("keeper").join("keeper.db"))
        .unwrap_or_else(|| PathBuf::from("keeper.db"))
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogSettings {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
