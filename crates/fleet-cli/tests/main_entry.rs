//! Integration tests for the `fleet` binary entry point.
//!
//! Covers configuration and connection failures that end the client before
//! any command is exchanged.

use std::net::TcpListener;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

#[test]
fn invalid_endpoint_is_rejected() {
    let mut command = cargo_bin_cmd!("fleet");
    command.args(["--listen-socket", "ftp://example.invalid"]);
    command
        .assert()
        .failure()
        .stderr(contains("failed to load configuration"));
}

#[test]
fn unreachable_daemon_exits_with_failure() {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind probe listener");
    let port = listener.local_addr().expect("probe address").port();
    drop(listener);

    let mut command = cargo_bin_cmd!("fleet");
    command.args(["--listen-socket", &format!("tcp://127.0.0.1:{port}"), "LIST_USERS"]);
    command
        .assert()
        .failure()
        .stderr(contains("failed to connect to daemon"));
}
