//! Whole-application runs through `run_app`.

use std::fs;
use std::path::Path;

use clap::Parser;
use report_merger::cli::Cli;
use report_merger::error::ExitCode;
use tempfile::TempDir;

use crate::{clear_env, ENV_MUTEX};

fn run(dir: &Path, extra: &[&str]) -> anyhow::Result<ExitCode> {
    let config = dir.join("merge.toml");
    if !config.exists() {
        fs::write(
            &config,
            "[[groups]]\nprefix = \"Rep_\"\noutput = \"out.csv\"\n",
        )
        .unwrap();
    }
    let dir_arg = dir.to_string_lossy().into_owned();
    let config_arg = config.to_string_lossy().into_owned();
    let mut args = vec![
        "report-merger",
        "-q",
        "run",
        "--config",
        config_arg.as_str(),
        "--work-dir",
        dir_arg.as_str(),
    ];
    args.extend_from_slice(extra);
    report_merger::run_app(Cli::try_parse_from(args).unwrap())
}

#[test]
fn test_run_merges_and_cleans_up() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Rep_2.csv"), "h\n2025-01-02,2\n").unwrap();
    fs::write(dir.path().join("Rep_1.csv"), "h\n2025-01-01,1\n").unwrap();

    let code = run(dir.path(), &[]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(
        fs::read_to_string(dir.path().join("out.csv")).unwrap(),
        "2025-01-01,1\n2025-01-02,2\n"
    );
    assert!(!dir.path().join("Rep_1.csv").exists());
    assert!(!dir.path().join("Rep_2.csv").exists());
}

#[test]
fn test_run_with_nothing_to_merge() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = TempDir::new().unwrap();

    let code = run(dir.path(), &[]).unwrap();
    assert_eq!(code, ExitCode::NothingToMerge);
}

#[test]
fn test_run_partial_failure_exit_code() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Rep_1.csv"), "h\nx\n").unwrap();
    fs::write(dir.path().join("Rep_2.csv"), "h\nx\n").unwrap();

    let code = run(dir.path(), &["--output", "json"]).unwrap();
    assert_eq!(code, ExitCode::PartialFailure);
    assert!(dir.path().join("Rep_1.csv").exists());
}

#[test]
fn test_run_group_flag_and_dry_run() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Sales 1.csv"), "h\n2025-01-01,1\n").unwrap();

    let code = run(
        dir.path(),
        &["--group", "Sales =sales.csv", "--dry-run", "--parallel"],
    )
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(dir.path().join("Sales 1.csv").exists());
    assert!(!dir.path().join("sales.csv").exists());
}

#[test]
fn test_missing_work_dir_is_fatal() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("merge.toml");
    fs::write(&config, "[[groups]]\nprefix = \"Rep_\"\noutput = \"out.csv\"\n").unwrap();
    let missing = dir.path().join("missing");

    let cli = Cli::try_parse_from([
        "report-merger",
        "-q",
        "run",
        "--config",
        config.to_str().unwrap(),
        "--work-dir",
        missing.to_str().unwrap(),
    ])
    .unwrap();
    let err = report_merger::run_app(cli).unwrap_err();
    assert!(format!("{err:#}").contains("work directory does not exist"));
}

#[test]
fn test_invalid_config_is_fatal() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("merge.toml"),
        "[[groups]]\nprefix = \"raw\"\noutput = \"raw.csv\"\n",
    )
    .unwrap();

    let err = run(dir.path(), &[]).unwrap_err();
    assert!(format!("{err:#}").contains("failed to load configuration"));
}

#[test]
fn test_groups_subcommand() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("merge.toml");
    fs::write(&config, "[[groups]]\nprefix = \"Rep_\"\noutput = \"out.csv\"\n").unwrap();
    fs::write(dir.path().join("Rep_1.csv"), "h\n1\n").unwrap();

    let cli = Cli::try_parse_from([
        "report-merger",
        "--no-color",
        "groups",
        "--config",
        config.to_str().unwrap(),
        "--work-dir",
        dir.path().to_str().unwrap(),
    ])
    .unwrap();

    assert_eq!(report_merger::run_app(cli).unwrap(), ExitCode::Success);
    assert!(dir.path().join("Rep_1.csv").exists());
}

#[test]
fn test_no_color_env_accepts_any_value() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();

    std::env::set_var("NO_COLOR", "1");
    let parsed = Cli::try_parse_from(["report-merger", "run"]);
    std::env::set_var("NO_COLOR", "0");
    let falsey = Cli::try_parse_from(["report-merger", "run"]);
    std::env::remove_var("NO_COLOR");

    assert!(parsed.unwrap().no_color);
    assert!(!falsey.unwrap().no_color);
}
