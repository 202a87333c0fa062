//! Behavioural smoke tests for the CLI entrypoint.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn state_dir_with(entries: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
    for (key, value) in entries {
        std::fs::write(tmp.path().join(key), value)
            .unwrap_or_else(|err| panic!("seed {key}: {err}"));
    }
    tmp
}

#[test]
fn help_lists_subcommands() {
    let mut cmd = cargo_bin_cmd!("strata");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("down"))
        .stdout(predicate::str::contains("show"));
}

#[test]
fn show_prints_selected_artifacts() {
    let state = state_dir_with(&[("bosh-ip", "52.0.0.10"), ("bosh-password", "hunter2\n")]);

    let mut cmd = cargo_bin_cmd!("strata");
    cmd.args(["--name", "demo", "--state-dir"])
        .arg(state.path())
        .args(["show", "--bosh-ip", "--bosh-password"])
        .assert()
        .success()
        .stdout("52.0.0.10\nhunter2\n");
}

#[test]
fn show_without_flags_fails() {
    let state = state_dir_with(&[]);

    let mut cmd = cargo_bin_cmd!("strata");
    cmd.args(["--name", "demo", "--state-dir"])
        .arg(state.path())
        .arg("show")
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("set at least one flag"));
}

#[test]
fn show_reports_missing_artifact() {
    let state = state_dir_with(&[]);

    let mut cmd = cargo_bin_cmd!("strata");
    cmd.args(["--name", "demo", "--state-dir"])
        .arg(state.path())
        .args(["show", "--ssh"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ssh-key"));
}

#[test]
fn show_does_not_create_default_state_dir() {
    let cwd = state_dir_with(&[]);

    let mut cmd = cargo_bin_cmd!("strata");
    cmd.current_dir(cwd.path())
        .args(["--name", "demo", "show", "--ssh"])
        .assert()
        .code(1);

    assert!(!cwd.path().join("environments").exists());
}

#[test]
fn invalid_name_is_rejected() {
    let state = state_dir_with(&[]);

    let mut cmd = cargo_bin_cmd!("strata");
    cmd.args(["--name", "9lives", "--state-dir"])
        .arg(state.path())
        .args(["show", "--bosh-ip"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid name \"9lives\""));
}

#[test]
fn missing_name_is_rejected() {
    let mut cmd = cargo_bin_cmd!("strata");
    cmd.args(["show", "--bosh-ip"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing --name"));
}

#[test]
fn missing_state_dir_is_rejected() {
    let state = state_dir_with(&[]);

    let mut cmd = cargo_bin_cmd!("strata");
    cmd.args(["--name", "demo", "--state-dir"])
        .arg(state.path().join("absent"))
        .args(["show", "--bosh-ip"])
        .assert()
        .code(1);
}

#[test]
fn up_requires_region() {
    let state = state_dir_with(&[]);

    let mut cmd = cargo_bin_cmd!("strata");
    cmd.env_remove("STRATA_REGION")
        .args(["--name", "demo", "--state-dir"])
        .arg(state.path())
        .arg("up")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("STRATA_REGION"));
}
