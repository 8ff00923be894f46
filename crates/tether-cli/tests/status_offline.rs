use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

/// Without a stored token the status command must answer locally, with no
/// probe traffic.
#[test]
fn test_status_without_token_reports_logged_out() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("tether")
        .env("TETHER_HOME", dir.path())
        .args(["status", "--endpoint", "https://code.example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));
}

/// Logout against an endpoint that never stored a token reports cleanly.
#[test]
fn test_logout_without_token() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("tether")
        .env("TETHER_HOME", dir.path())
        .args(["logout", "--endpoint", "https://code.example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No stored token"));
}
