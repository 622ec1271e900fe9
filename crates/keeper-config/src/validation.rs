// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for settings values.

use crate::diagnostic::ConfigError;
use crate::model::KeeperSettings;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate deserialized settings for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_settings(settings: &KeeperSettings) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if settings.worker.thread_name.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "worker.thread_name must not be empty".to_string(),
        });
    }

    // Thread names containing NUL make std::thread::Builder::spawn fail.
    if settings.worker.thread_name.contains('\0') {
        errors.push(ConfigError::Validation {
            message: "worker.thread_name must not contain NUL bytes".to_string(),
        });
    }

    if settings.worker.close_timeout_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "worker.close_timeout_ms must be greater than zero".to_string(),
        });
    }

    if settings.sqlite.database_path.as_os_str().is_empty() {
        errors.push(ConfigError::Validation {
            message: "sqlite.database_path must not be empty".to_string(),
        });
    }

    // SQLite takes the busy timeout as a C int.
    if i32::try_from(settings.sqlite.busy_timeout_ms).is_err() {
        errors.push(ConfigError::Validation {
            message: format!(
                "sqlite.busy_timeout_ms must be at most {}, got {}",
                i32::MAX,
                settings.sqlite.busy_timeout_ms
            ),
        });
    }

    let level = settings.log.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{}` is not one of: {}",
                settings.log.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_settings_validate() {
        assert!(validate_settings(&KeeperSettings::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut settings = KeeperSettings::default();
        settings.sqlite.database_path = std::path::PathBuf::new();
        let errors = validate_settings(&settings).unwrap_err();
        assert!(has_message(&errors, "database_path"));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut settings = KeeperSettings::default();
        settings.log.level = "loud".to_string();
        let errors = validate_settings(&settings).unwrap_err();
        assert!(has_message(&errors, "log.level"));
    }

    #[test]
    fn collects_all_errors() {
        let mut settings = KeeperSettings::default();
        settings.worker.thread_name = "  ".to_string();
        settings.worker.close_timeout_ms = 0;
        settings.log.level = "verbose".to_string();
        let errors = validate_settings(&settings).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(has_message(&errors, "thread_name"));
        assert!(has_message(&errors, "close_timeout_ms"));
    }

    #[test]
    fn busy_timeout_must_fit_a_c_int() {
        let mut settings = KeeperSettings::default();
        settings.sqlite.busy_timeout_ms = 1 << 31;
        let errors = validate_settings(&settings).unwrap_err();
        assert!(has_message(&errors, "sqlite.busy_timeout_ms"));

        settings.sqlite.busy_timeout_ms = i32::MAX as u64;
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn uppercase_log_level_is_accepted() {
        let mut settings = KeeperSettings::default();
        settings.log.level = "DEBUG".to_string();
        assert!(validate_settings(&settings).is_ok());
    }
}
