use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Binary pointed at an isolated config file
fn cli(config_dir: &TempDir) -> Command {
    let config = config_dir.path().join("config.yml");
    std::fs::write(&config, "sleep: 1\ntimeout: 0\n").unwrap();

    let mut cmd = Command::cargo_bin("qv-edx-trigger").unwrap();
    cmd.env("QVEDX_CONFIG", &config);
    cmd
}

#[test]
fn test_no_arguments_prints_usage() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("--task"));
}

#[test]
fn test_help_and_version() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--timeout"));

    cli(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_usage_errors_exit_nine() {
    let dir = TempDir::new().unwrap();
    cli(&dir).arg("--bogus").assert().code(9);
    cli(&dir).arg("-v").assert().code(9);
    cli(&dir)
        .args(["--task", "Nightly", "--sleep", "soon"])
        .assert()
        .code(9);
}

#[test]
fn test_missing_config_file_exits_nine() {
    let dir = TempDir::new().unwrap();
    Command::cargo_bin("qv-edx-trigger")
        .unwrap()
        .env("QVEDX_CONFIG", dir.path().join("absent.yml"))
        .args(["--task", "Nightly"])
        .assert()
        .code(9)
        .stderr(predicate::str::contains("Cannot read config file"))
        .stderr(predicate::str::contains("[Nightly] [-1]"));
}

#[test]
fn test_usage_error_logged_under_task() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["--task=Nightly", "--sleep", "soon"])
        .assert()
        .code(9)
        .stderr(predicate::str::contains("[Nightly] [-1]"));
}

#[test]
fn test_unreachable_service_exits_ten() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["--task", "Nightly", "--service", "http://127.0.0.1:1/QMS/Service"])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("(Error code: 10)"));
}
