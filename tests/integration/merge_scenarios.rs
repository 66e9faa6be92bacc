//! End-to-end pipeline runs against a real temporary work directory.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use report_merger::actions::FsDeleter;
use report_merger::config::{Config, Group};
use report_merger::error::ExitCode;
use report_merger::pipeline::{ErrorKind, GroupError, GroupPipeline, PipelineOptions};
use report_merger::scanner::DirLister;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

fn pipeline(dir: &Path) -> GroupPipeline {
    GroupPipeline::new(
        dir,
        Arc::new(DirLister::new(dir)),
        Arc::new(FsDeleter::permanent()),
    )
}

fn names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_three_file_merge_in_date_order() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Rep_A.csv", "Date,V\n2025-01-03,c\n");
    write(dir.path(), "Rep_B.csv", "Date,V\n2025-01-01,a\n");
    write(dir.path(), "Rep_C.csv", "Date,V\n2025-01-02,b\n");

    let result = pipeline(dir.path()).process(&Group::new("Rep_", "out.csv"));

    assert!(result.is_success(), "{:?}", result.error);
    assert_eq!(result.files_found, 3);
    assert_eq!(result.files_merged, 3);
    assert_eq!(
        result.dates_found,
        vec!["2025-01-01", "2025-01-02", "2025-01-03"]
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("out.csv")).unwrap(),
        "2025-01-01,a\n2025-01-02,b\n2025-01-03,c\n"
    );
    assert_eq!(names(dir.path()), vec!["out.csv"]);
}

#[test]
fn test_duplicate_content_leaves_sources() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Rep_A.csv", "Date,V\n2025-01-01,a\n");
    write(dir.path(), "Rep_B.csv", "Date,V\n2025-01-01,a\n");

    let result = pipeline(dir.path()).process(&Group::new("Rep_", "out.csv"));

    let err = result.error.as_ref().unwrap();
    assert_eq!(err.kind(), ErrorKind::DuplicateContent);
    assert!(err.to_string().contains("Rep_"));
    assert_eq!(result.files_merged, 0);
    assert!(result.dates_found.is_empty());
    assert_eq!(names(dir.path()), vec!["Rep_A.csv", "Rep_B.csv"]);
}

#[test]
fn test_second_run_finds_nothing() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "AdManager Reporting 1.csv", "h\n2025-02-01,1\n");
    write(dir.path(), "Revenue per AdUnit 1.csv", "h\n2025-02-01,9\n");
    let groups = Config::default().groups;
    let pipeline = pipeline(dir.path());

    let first = pipeline.process_all(&groups);
    assert!(first.iter().all(|r| r.is_success()));
    assert_eq!(ExitCode::from_results(&first), ExitCode::Success);
    let raw = fs::read(dir.path().join("raw.csv")).unwrap();
    let revenue = fs::read(dir.path().join("raw-revenue.csv")).unwrap();

    let second = pipeline.process_all(&groups);
    assert!(second
        .iter()
        .all(|r| matches!(r.error, Some(GroupError::NotFound { .. }))));
    assert_eq!(ExitCode::from_results(&second), ExitCode::NothingToMerge);
    assert_eq!(fs::read(dir.path().join("raw.csv")).unwrap(), raw);
    assert_eq!(fs::read(dir.path().join("raw-revenue.csv")).unwrap(), revenue);
    assert_eq!(names(dir.path()), vec!["raw-revenue.csv", "raw.csv"]);
}

#[test]
fn test_one_failing_group_does_not_affect_another() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Good_1.csv", "h\n2025-01-01,1\n");
    write(dir.path(), "Good_2.csv", "h\n2025-01-02,2\n");
    write(dir.path(), "Bad_1.csv", "h\nsame\n");
    write(dir.path(), "Bad_2.csv", "h\nsame\n");
    let groups = vec![Group::new("Bad_", "bad.csv"), Group::new("Good_", "good.csv")];

    let results = pipeline(dir.path()).process_all(&groups);

    assert!(matches!(
        results[0].error,
        Some(GroupError::DuplicateContent { .. })
    ));
    assert!(results[1].is_success());
    assert_eq!(ExitCode::from_results(&results), ExitCode::PartialFailure);
    assert_eq!(
        names(dir.path()),
        vec!["Bad_1.csv", "Bad_2.csv", "good.csv"]
    );
}

#[test]
fn test_prefix_is_case_sensitive_and_non_recursive() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Rep_1.csv", "h\n2025-01-01,1\n");
    write(dir.path(), "rep_2.csv", "h\n2025-01-02,2\n");
    fs::create_dir(dir.path().join("Rep_dir")).unwrap();
    write(&dir.path().join("Rep_dir"), "Rep_3.csv", "h\n2025-01-03,3\n");

    let result = pipeline(dir.path()).process(&Group::new("Rep_", "out.csv"));

    assert!(result.is_success());
    assert_eq!(result.files_found, 1);
    assert!(dir.path().join("rep_2.csv").exists());
    assert!(dir.path().join("Rep_dir/Rep_3.csv").exists());
}

#[test]
fn test_dry_run_and_keep_sources() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Rep_A.csv", "Date,V\n2025-01-02,b\n");
    write(dir.path(), "Rep_B.csv", "Date,V\n2025-01-01,a\n");
    let group = Group::new("Rep_", "out.csv");

    let dry = pipeline(dir.path())
        .with_options(PipelineOptions {
            dry_run: true,
            keep_sources: false,
        })
        .process(&group);
    assert!(dry.is_success());
    assert_eq!(
        dry.merge_order,
        vec![dir.path().join("Rep_B.csv"), dir.path().join("Rep_A.csv")]
    );
    assert_eq!(names(dir.path()), vec!["Rep_A.csv", "Rep_B.csv"]);

    let kept = pipeline(dir.path())
        .with_options(PipelineOptions {
            dry_run: false,
            keep_sources: true,
        })
        .process(&group);
    assert!(kept.is_success());
    assert_eq!(
        names(dir.path()),
        vec!["Rep_A.csv", "Rep_B.csv", "out.csv"]
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("out.csv")).unwrap(),
        "2025-01-01,a\n2025-01-02,b\n"
    );
}

#[test]
fn test_parallel_matches_sequential() {
    let seq_dir = TempDir::new().unwrap();
    let par_dir = TempDir::new().unwrap();
    let groups: Vec<Group> = (0..6)
        .map(|i| Group::new(format!("G{i}_"), format!("merged_{i}.csv")))
        .collect();
    for dir in [&seq_dir, &par_dir] {
        for i in 0..6 {
            for day in 1..=3 {
                write(
                    dir.path(),
                    &format!("G{i}_{day}.csv"),
                    &format!("h\n2025-03-0{day},{i}\n"),
                );
            }
        }
    }

    let sequential = pipeline(seq_dir.path()).process_all(&groups);
    let parallel = pipeline(par_dir.path()).process_all_parallel(&groups, 3);

    for (s, p) in sequential.iter().zip(&parallel) {
        assert_eq!(s.group, p.group);
        assert_eq!(s.dates_found, p.dates_found);
        assert_eq!(
            fs::read(&s.output_file).unwrap(),
            fs::read(&p.output_file).unwrap()
        );
    }
}

#[test]
fn test_from_config_uses_work_dir() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Rep_1.csv", "h\n2025-01-01,1\n");
    let config = Config {
        groups: vec![Group::new("Rep_", "out.csv")],
        work_dir: dir.path().to_string_lossy().into_owned(),
        keep_sources: true,
        ..Config::default()
    };

    let pipeline = GroupPipeline::from_config(&config).unwrap();
    assert_eq!(pipeline.work_dir(), dir.path());
    assert!(pipeline.options().keep_sources);

    let results = pipeline.process_all(&config.groups);
    assert!(results[0].is_success());
    assert!(dir.path().join("Rep_1.csv").exists());
    assert!(dir.path().join("out.csv").exists());
}
