//! CLI smoke tests using `assert_cmd` + `predicates`.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn prints_help() {
    let mut cmd = Command::cargo_bin("cmux").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("terminal multiplexer"));
}

#[test]
fn prints_version() {
    let mut cmd = Command::cargo_bin("cmux").unwrap();
    cmd.arg("--version").assert().success();
}

#[test]
fn rejects_unknown_flag() {
    let mut cmd = Command::cargo_bin("cmux").unwrap();
    cmd.arg("--not-a-real-flag").assert().failure();
}
