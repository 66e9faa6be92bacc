//! Configuration layering: defaults, TOML file, environment and CLI overrides.

use std::fs;

use report_merger::config::{Config, ConfigError, ConfigOverrides, Group};
use tempfile::tempdir;

use crate::{clear_env, ENV_MUTEX};

#[test]
fn test_explicit_file_replaces_groups() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
work_dir = "/srv/exports"
use_trash = true

[[groups]]
prefix = "Daily Sales"
output = "sales.csv"
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path), &ConfigOverrides::default()).unwrap();

    assert_eq!(config.groups, vec![Group::new("Daily Sales", "sales.csv")]);
    assert_eq!(config.work_dir, "/srv/exports");
    assert!(config.use_trash);
    assert!(!config.keep_sources);
    assert_eq!(config.jobs, 0);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();

    let err = Config::load(
        Some(&dir.path().join("nope.toml")),
        &ConfigOverrides::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::MissingFile(_)));
}

#[test]
fn test_malformed_file_is_an_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "work_dir = [not valid").unwrap();

    let err = Config::load(Some(&path), &ConfigOverrides::default()).unwrap_err();
    assert!(matches!(err, ConfigError::Extract(_)));
}

#[test]
fn test_env_overrides_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "work_dir = \"/from/file\"\nkeep_sources = false\n").unwrap();

    std::env::set_var("REPORT_MERGER_WORK_DIR", "/from/env");
    std::env::set_var("REPORT_MERGER_KEEP_SOURCES", "true");
    std::env::set_var("REPORT_MERGER_JOBS", "3");
    let config = Config::load(Some(&path), &ConfigOverrides::default());
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.work_dir, "/from/env");
    assert!(config.keep_sources);
    assert_eq!(config.jobs, 3);
    assert_eq!(config.groups, Config::default().groups);
}

#[test]
fn test_cli_overrides_env() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "parallel = false\n").unwrap();

    std::env::set_var("REPORT_MERGER_WORK_DIR", "/from/env");
    let overrides = ConfigOverrides {
        work_dir: Some("/from/cli".to_string()),
        groups: Some(vec![Group::new("X", "x.csv")]),
        parallel: Some(true),
        ..ConfigOverrides::default()
    };
    let config = Config::load(Some(&path), &overrides);
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.work_dir, "/from/cli");
    assert_eq!(config.groups, vec![Group::new("X", "x.csv")]);
    assert!(config.parallel);
}

#[test]
fn test_invalid_groups_rejected_after_merge() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[[groups]]
prefix = "Report"
output = "a.csv"

[[groups]]
prefix = "Report per Day"
output = "b.csv"
"#,
    )
    .unwrap();

    let err = Config::load(Some(&path), &ConfigOverrides::default()).unwrap_err();
    assert!(matches!(err, ConfigError::OverlappingPrefix(_, _)));
}

#[test]
fn test_empty_group_list_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "groups = []\n").unwrap();

    let err = Config::load(Some(&path), &ConfigOverrides::default()).unwrap_err();
    assert!(matches!(err, ConfigError::NoGroups));
}
