//! Integration tests for the `example run` command.
use tempfile::tempdir;
use ucdm::cli::SolveOpts;
use ucdm::cli::example::handle_example_run_command;
use ucdm::settings::Settings;

/// An integration test for the `example run` command.
#[test]
fn test_handle_example_run_command() {
    unsafe { std::env::set_var("UCDM_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    let opts = SolveOpts {
        output_dir: Some(tempdir.path().join("results")),
        sweeps: Some(100),
        ..SolveOpts::default()
    };
    handle_example_run_command("simple", &opts, Some(Settings::default())).unwrap();
}
