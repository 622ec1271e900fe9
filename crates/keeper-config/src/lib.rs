// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Settings and default-configuration handling for Keeper.
//!
//! Provides TOML settings parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, `KEEPER_*` environment overrides, miette
//! diagnostics with typo suggestions, and the injectable [`DefaultConfig`]
//! holder that workers fall back to when opened without a configuration.
//!
//! # Usage
//!
//! ```no_run
//! use keeper_config::load_and_validate;
//!
//! let settings = load_and_validate().expect("config errors");
//! println!("database: {}", settings.sqlite.database_path.display());
//! ```

pub mod default;
pub mod diagnostic;
pub mod loader;
pub mod logging;
pub mod model;
pub mod validation;

pub use default::DefaultConfig;
pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_settings, load_settings_from_path, load_settings_from_str};
pub use logging::init_tracing;
pub use model::{KeeperSettings, LogSettings, SqliteConfig, WorkerSettings};

/// Load settings from the XDG hierarchy and validate them.
///
/// Figment errors become diagnostics with source spans where the offending
/// file can be found.
pub fn load_and_validate() -> Result<KeeperSettings, Vec<ConfigError>> {
    match loader::load_settings() {
        Ok(settings) => {
            validation::validate_settings(&settings)?;
            Ok(settings)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &collect_toml_sources(),
        )),
    }
}

/// Load settings from a TOML string and validate them.
pub fn load_and_validate_str(toml_content: &str) -> Result<KeeperSettings, Vec<ConfigError>> {
    match loader::load_settings_from_str(toml_content) {
        Ok(settings) => {
            validation::validate_settings(&settings)?;
            Ok(settings)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Collapse diagnostics into a single [`keeper_core::KeeperError::Config`].
pub fn into_keeper_error(errors: &[ConfigError]) -> keeper_core::KeeperError {
    let joined = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    keeper_core::KeeperError::Config(joined)
}

fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![std::path::PathBuf::from(loader::SYSTEM_CONFIG_PATH)];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("keeper").join(loader::LOCAL_CONFIG_FILE));
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(loader::LOCAL_CONFIG_FILE));
    }

    candidates
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            Some((path.display().to_string(), content))
        })
        .collect()
}
