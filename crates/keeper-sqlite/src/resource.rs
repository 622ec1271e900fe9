// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`Resource`] implementation over a single `rusqlite::Connection`.

use std::panic::{self, AssertUnwindSafe};

use keeper_config::SqliteConfig;
use keeper_core::{BoxError, Resource};
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::database::{checkpoint, open_connection, SqliteError};

/// A SQLite database owned by one worker thread.
///
/// Task bodies receive `&mut SqliteResource` and issue statements through
/// [`connection`](Self::connection); the surrounding transaction is managed
/// by [`Resource::transact`].
#[derive(Debug)]
pub struct SqliteResource {
    conn: Connection,
    config: SqliteConfig,
}

impl SqliteResource {
    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// The configuration this database was opened with.
    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    fn user_tables(&self) -> Result<Vec<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
        names.collect()
    }
}

impl Resource for SqliteResource {
    type Config = SqliteConfig;

    fn open(config: &SqliteConfig) -> Result<Self, BoxError> {
        let conn = open_connection(config)?;
        Ok(Self {
            conn,
            config: config.clone(),
        })
    }

    fn refresh(&mut self) -> Result<(), BoxError> {
        if !self.conn.is_autocommit() {
            return Err(SqliteError::TransactionOpen.into());
        }
        // Statements cached against an older schema are re-prepared on demand.
        self.conn.flush_prepared_statement_cache();
        Ok(())
    }

    fn transact<T, F>(&mut self, body: F) -> Result<T, BoxError>
    where
        F: FnOnce(&mut Self) -> Result<T, BoxError>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;

        match panic::catch_unwind(AssertUnwindSafe(|| body(self))) {
            Ok(Ok(value)) => match self.conn.execute_batch("COMMIT") {
                Ok(()) => Ok(value),
                Err(e) => {
                    rollback(&self.conn);
                    Err(e.into())
                }
            },
            Ok(Err(e)) => {
                debug!(error = %e, "transaction body failed, rolling back");
                rollback(&self.conn);
                Err(e)
            }
            Err(payload) => {
                rollback(&self.conn);
                panic::resume_unwind(payload)
            }
        }
    }

    fn is_empty(&self) -> Result<bool, BoxError> {
        for table in self.user_tables()? {
            let sql = format!(
                "SELECT EXISTS (SELECT 1 FROM \"{}\")",
                table.replace('"', "\"\"")
            );
            let has_rows: bool = self.conn.query_row(&sql, [], |row| row.get(0))?;
            if has_rows {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn close(self) -> Result<(), BoxError> {
        if self.config.wal_mode {
            checkpoint(&self.conn)?;
            debug!(path = %self.config.database_path.display(), "WAL checkpoint complete");
        }
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(())
    }
}

fn rollback(conn: &Connection) {
    if conn.is_autocommit() {
        return;
    }
    if let Err(e) = conn.execute_batch("ROLLBACK") {
        warn!(error = %e, "rollback failed");
    }
}
