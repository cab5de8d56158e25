//! Integration tests for the `experiment` command.
use std::path::PathBuf;
use tempfile::tempdir;
use ucdm::cli::{GridOpts, SolveOpts, handle_experiment_command};
use ucdm::settings::Settings;

/// Get the path to the example instance.
fn get_instance_dir() -> PathBuf {
    PathBuf::from("demos/simple")
}

/// An integration test for the `experiment` command.
#[test]
fn test_handle_experiment_command() {
    unsafe { std::env::set_var("UCDM_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    let output_dir = tempdir.path().join("results");
    let grid = GridOpts {
        periods_start: 1,
        periods_end: 2,
        units_start: 2,
        units_end: 2,
        ..GridOpts::default()
    };
    let opts = SolveOpts {
        output_dir: Some(output_dir.clone()),
        sweeps: Some(100),
        ..SolveOpts::default()
    };
    handle_experiment_command(&get_instance_dir(), &grid, &opts, Some(Settings::default()))
        .unwrap();

    assert!(output_dir.join("metadata.toml").is_file());
    assert!(output_dir.join("solution_001_002.json").is_file());
    assert!(output_dir.join("solution_002_002.json").is_file());

    let summary = std::fs::read_to_string(output_dir.join("summary.csv")).unwrap();
    assert_eq!(summary.lines().count(), 3);
}
