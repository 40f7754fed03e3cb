mod common;

use common::mock_store::MockPetStore;
use std::process::{Command, Output};

fn cli() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_petstore-e2e"));
    // keep CI and PETSTORE_* from the outer environment out of the run
    command.env_clear();
    command
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_cli_list_prints_every_case() {
    let output = cli().arg("list").output().expect("run cli");
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("[positive] TestId: 1001. Adds new pet to the store."));
    assert!(text.contains("[negative] TestId: 2002. Search for a pet that does not exist, return 404"));
    assert!(text.contains("9 cases"));
}

#[test]
fn test_cli_list_applies_grep() {
    let output = cli()
        .args(["list", "--grep", "TestId: 20"])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(!text.contains("TestId: 1001"));
    assert!(text.contains("3 cases"));
}

#[test]
fn test_cli_run_against_mock_store() {
    let store = MockPetStore::start();
    let dir = tempfile::tempdir().unwrap();
    let output = cli()
        .arg("run")
        .args(["--base-url", &store.base_url()])
        .args(["--reporter", "list", "--reporter", "json"])
        .arg("--output-dir")
        .arg(dir.path())
        .args(["--asset", common::asset_path()])
        .args(["--workers", "2"])
        .output()
        .expect("run cli");

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(stdout(&output).contains("9 passed, 0 flaky, 0 failed, 0 skipped (9 total)"));
    let report: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("report.json")).unwrap()).unwrap();
    assert_eq!(report["summary"]["passed"], 9);
    assert_eq!(store.pet_count(), 0);
}

#[test]
fn test_cli_run_exits_one_on_failure() {
    let store = MockPetStore::start();
    store.ignore_updates(true);
    let dir = tempfile::tempdir().unwrap();
    let output = cli()
        .arg("run")
        .args(["--base-url", &store.base_url()])
        .args(["--reporter", "github"])
        .arg("--output-dir")
        .arg(dir.path())
        .args(["--grep", "TestId: 1003"])
        .output()
        .expect("run cli");

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("::error title=TestId%3A 1003."));
}

#[test]
fn test_cli_invalid_env_exits_two() {
    let output = cli()
        .env("PETSTORE_RETRIES", "lots")
        .arg("list")
        .output()
        .expect("run cli");
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("PETSTORE_RETRIES"));
}

#[test]
fn test_cli_missing_config_file_exits_two() {
    let output = cli()
        .args(["--config", "/definitely/not/here.toml", "list"])
        .output()
        .expect("run cli");
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("/definitely/not/here.toml"));
}
