// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite resource for Keeper workers.
//!
//! [`SqliteResource`] owns one `rusqlite::Connection`. A worker opens it on
//! its own thread and every write goes through that single connection, so
//! SQLite never sees two writers from the same process.

pub mod database;
pub mod resource;

pub use database::SqliteError;
pub use resource::SqliteResource;
