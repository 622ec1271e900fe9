// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection setup: parent directories, PRAGMAs, WAL mode.

use std::path::{Path, PathBuf};
use std::time::Duration;

use keeper_config::SqliteConfig;
use rusqlite::Connection;
use thiserror::Error;
use tracing::debug;

/// Failures specific to the SQLite resource.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// The database's parent directory could not be created.
    #[error("cannot create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// SQLite refused to open the database file.
    #[error("cannot open database {path}: {source}")]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },

    /// A connection PRAGMA could not be applied.
    #[error("cannot apply {pragma} to {path}: {source}")]
    Pragma {
        pragma: &'static str,
        path: PathBuf,
        source: rusqlite::Error,
    },

    /// The busy timeout does not fit SQLite's C `int`.
    #[error("busy timeout of {millis} ms is too large, the maximum is {} ms", i32::MAX)]
    BusyTimeout { millis: u64 },

    /// SQLite did not switch to WAL journaling.
    #[error("database {path} stayed in {mode} journal mode")]
    JournalMode { path: PathBuf, mode: String },

    /// The connection was left inside a transaction by an earlier task.
    #[error("connection is still inside a transaction")]
    TransactionOpen,
}

/// Opens the database described by `config` and applies its PRAGMAs.
pub fn open_connection(config: &SqliteConfig) -> Result<Connection, SqliteError> {
    let path = config.database_path.as_path();
    if i32::try_from(config.busy_timeout_ms).is_err() {
        return Err(SqliteError::BusyTimeout {
            millis: config.busy_timeout_ms,
        });
    }
    ensure_parent_dir(path)?;

    let conn = Connection::open(path).map_err(|source| SqliteError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|source| pragma_error("busy_timeout", path, source))?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(|source| pragma_error("foreign_keys", path, source))?;

    if config.wal_mode {
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(|source| pragma_error("journal_mode", path, source))?;
        if !mode.eq_ignore_ascii_case("wal") {
            return Err(SqliteError::JournalMode {
                path: path.to_path_buf(),
                mode,
            });
        }
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|source| pragma_error("synchronous", path, source))?;
    }

    debug!(path = %path.display(), wal = config.wal_mode, "database opened");
    Ok(conn)
}

/// Truncates the write-ahead log into the main database file.
pub fn checkpoint(conn: &Connection) -> Result<(), rusqlite::Error> {
    // wal_checkpoint returns a status row, so it is read rather than executed.
    conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), SqliteError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| SqliteError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

fn pragma_error(pragma: &'static str, path: &Path, source: rusqlite::Error) -> SqliteError {
    SqliteError::Pragma {
        pragma,
        path: path.to_path_buf(),
        source,
    }
}
