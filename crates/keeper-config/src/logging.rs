// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tracing subscriber setup for applications embedding Keeper.

use tracing_subscriber::EnvFilter;

/// Builds the filter used by [`init_tracing`].
///
/// `RUST_LOG` wins when set; otherwise Keeper crates log at `log_level` and
/// everything else at `warn`.
pub fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("keeper={log_level},warn")))
}

/// Installs a global fmt subscriber.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(log_level: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(log_level))
        .with_target(true)
        .with_thread_names(true)
        .try_init()
        .is_ok()
}
