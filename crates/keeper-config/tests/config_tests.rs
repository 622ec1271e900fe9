// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for Keeper settings loading.

use std::path::Path;

use figment::Jail;
use keeper_config::diagnostic::ConfigError;
use keeper_config::{
    load_and_validate, load_and_validate_str, load_settings, load_settings_from_path,
    load_settings_from_str, KeeperSettings,
};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_settings() {
    let toml = r#"
[worker]
thread_name = "db-writer"
close_timeout_ms = 250

[sqlite]
database_path = "/tmp/keeper-test.db"
wal_mode = false
busy_timeout_ms = 100

[log]
level = "debug"
"#;

    let settings = load_settings_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(settings.worker.thread_name, "db-writer");
    assert_eq!(settings.worker.close_timeout_ms, 250);
    assert_eq!(
        settings.sqlite.database_path,
        Path::new("/tmp/keeper-test.db")
    );
    assert!(!settings.sqlite.wal_mode);
    assert_eq!(settings.sqlite.busy_timeout_ms, 100);
    assert_eq!(settings.log.level, "debug");
}

/// Empty TOML falls back to compiled defaults.
#[test]
fn missing_sections_use_defaults() {
    let settings = load_settings_from_str("").expect("empty TOML should use defaults");
    assert_eq!(settings.worker.thread_name, "keeper-worker");
    assert_eq!(settings.worker.close_timeout_ms, 5_000);
    assert!(settings.sqlite.wal_mode);
    assert_eq!(settings.sqlite.busy_timeout_ms, 5_000);
    assert_eq!(settings.log.level, "info");
}

/// A typo in a key is rejected and the diagnostic suggests the right key.
#[test]
fn unknown_key_gets_suggestion() {
    let toml = r#"
[sqlite]
databse_path = "/tmp/x.db"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown key");
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key, suggestion, ..
            } => Some((key.clone(), suggestion.clone())),
            _ => None,
        })
        .expect("an UnknownKey diagnostic");
    assert_eq!(unknown.0, "databse_path");
    assert_eq!(unknown.1.as_deref(), Some("database_path"));
}

/// Wrong value types become InvalidType diagnostics.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[worker]
close_timeout_ms = "soon"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject string timeout");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("close_timeout_ms"))));
}

/// Deserialization succeeds but validation still catches bad values.
#[test]
fn validation_runs_after_deserialization() {
    let toml = r#"
[log]
level = "chatty"
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert!(matches!(&errors[0], ConfigError::Validation { message } if message.contains("chatty")));
}

/// `KEEPER_SQLITE_DATABASE_PATH` maps to `sqlite.database_path`, not `sqlite.database.path`.
#[test]
fn env_vars_override_file_values() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "custom.toml",
            r#"
[sqlite]
database_path = "from-file.db"
wal_mode = true
"#,
        )?;
        jail.set_env("KEEPER_SQLITE_DATABASE_PATH", "from-env.db");
        jail.set_env("KEEPER_WORKER_THREAD_NAME", "env-worker");

        let settings = load_settings_from_path(Path::new("custom.toml"))?;
        assert_eq!(settings.sqlite.database_path, Path::new("from-env.db"));
        assert!(settings.sqlite.wal_mode);
        assert_eq!(settings.worker.thread_name, "env-worker");
        Ok(())
    });
}

/// Env overrides apply through the full XDG loader, lowercase or not.
#[test]
fn env_overrides_apply_to_full_hierarchy() {
    Jail::expect_with(|jail| {
        jail.set_env("KEEPER_LOG_LEVEL", "debug");
        jail.set_env("KEEPER_WORKER_CLOSE_TIMEOUT_MS", "250");
        jail.set_env("KEEPER_SQLITE_BUSY_TIMEOUT_MS", "10");
        jail.set_env("KEEPER_SQLITE_WAL_MODE", "false");

        let settings = load_settings()?;
        assert_eq!(settings.log.level, "debug");
        assert_eq!(settings.worker.close_timeout_ms, 250);
        assert_eq!(settings.sqlite.busy_timeout_ms, 10);
        assert!(!settings.sqlite.wal_mode);

        let validated = load_and_validate().expect("env settings should validate");
        assert_eq!(validated.log.level, "debug");
        Ok(())
    });
}

/// A local `keeper.toml` is picked up and env still wins over it.
#[test]
fn local_file_is_overridden_by_env() {
    Jail::expect_with(|jail| {
        jail.create_file("keeper.toml", "[log]\nlevel = \"warn\"\n\n[worker]\nthread_name = \"local\"\n")?;
        jail.set_env("KEEPER_LOG_LEVEL", "error");

        let settings = load_settings()?;
        assert_eq!(settings.log.level, "error");
        assert_eq!(settings.worker.thread_name, "local");
        Ok(())
    });
}

/// Missing settings files are skipped.
#[test]
fn missing_file_yields_defaults() {
    Jail::expect_with(|_jail| {
        let settings = load_settings_from_path(Path::new("does-not-exist.toml"))?;
        assert_eq!(settings.log.level, "info");
        Ok(())
    });
}

/// Defaults survive a serialize/deserialize cycle through TOML.
#[test]
fn default_settings_serialize_to_valid_toml() {
    let rendered = toml::to_string(&KeeperSettings::default()).expect("serialize");
    let parsed = load_and_validate_str(&rendered).expect("defaults should validate");
    assert_eq!(parsed.worker.thread_name, "keeper-worker");
}

/// Diagnostics collapse into a single configuration error for callers.
#[test]
fn diagnostics_collapse_into_keeper_error() {
    let errors = load_and_validate_str("[log]\nlevel = \"x\"\n").unwrap_err();
    let err = keeper_config::into_keeper_error(&errors);
    assert!(matches!(err, keeper_core::KeeperError::Config(ref m) if m.contains("log.level")));
}
