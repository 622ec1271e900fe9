// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Settings loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./keeper.toml` > `~/.config/keeper/keeper.toml` > `/etc/keeper/keeper.toml`
//! with environment variable overrides via `KEEPER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::KeeperSettings;

/// System-wide settings file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/keeper/keeper.toml";

/// Settings file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "keeper.toml";

/// Load settings from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/keeper/keeper.toml` (system-wide)
/// 3. `~/.config/keeper/keeper.toml` (user XDG config)
/// 4. `./keeper.toml` (local directory)
/// 5. `KEEPER_*` environment variables
pub fn load_settings() -> Result<KeeperSettings, figment::Error> {
    build_figment().extract()
}

/// Load settings from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_settings_from_str(toml_content: &str) -> Result<KeeperSettings, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeeperSettings::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load settings from a specific file path with env var overrides.
pub fn load_settings_from_path(path: &Path) -> Result<KeeperSettings, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeeperSettings::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for the XDG hierarchy (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(KeeperSettings::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("keeper").join(LOCAL_CONFIG_FILE))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

const ENV_SECTIONS: &[&str] = &["worker", "sqlite", "log"];

/// Environment provider mapping the first underscore to a section separator.
///
/// `Env::split("_")` would turn `KEEPER_SQLITE_DATABASE_PATH` into
/// `sqlite.database.path`; the explicit map keeps it `sqlite.database_path`.
fn env_provider() -> Env {
    Env::prefixed("KEEPER_").map(|key| {
        // Keys arrive in their original case (`SQLITE_DATABASE_PATH`).
        let key = key.as_str().to_ascii_lowercase();
        let mapped = ENV_SECTIONS
            .iter()
            .find_map(|section| {
                key.strip_prefix(*section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|field| format!("{section}.{field}"))
            })
            .unwrap_or(key);
        mapped.into()
    })
}
