#![cfg(all(unix, feature = "cli"))]

use std::process::{Command, Output};

const MISSING_PORT: &str = "/dev/servoprobe-missing-port";

fn servoprobe(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_servoprobe"))
        .args(["--log-level", "error"])
        .args(args)
        .env_remove("SERVOPROBE_PORT")
        .env_remove("SERVOPROBE_BAUD")
        .output()
        .expect("servoprobe should run")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn version_prints_package_version() {
    let output = servoprobe(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("servoprobe {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn extended_version_lists_build_details() {
    let output = servoprobe(&["version", "--extended"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name: servoprobe"));
    assert!(stdout.contains("default_baud: 115200"));
}

#[test]
fn invalid_servo_id_is_rejected_before_opening_the_port() {
    let output = servoprobe(&["--port", MISSING_PORT, "send", "7", "90"]);
    assert_eq!(output.status.code(), Some(60));
    assert!(stderr(&output).contains("invalid servo ID: 7 (must be 0-6)"));
}

#[test]
fn invalid_angle_is_rejected_before_opening_the_port() {
    let output = servoprobe(&["--port", MISSING_PORT, "send", "0", "181"]);
    assert_eq!(output.status.code(), Some(60));
    assert!(stderr(&output).contains("invalid angle: 181 (must be 0-180)"));
}

#[test]
fn missing_port_is_a_transport_error() {
    let output = servoprobe(&["--port", MISSING_PORT, "--settle", "0s", "send", "0", "90"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("connect failed"));
}

#[test]
fn default_mode_reports_missing_port() {
    let output = servoprobe(&["--port", MISSING_PORT, "--settle", "0s"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn malformed_duration_is_a_usage_error() {
    let output = servoprobe(&["--port", MISSING_PORT, "--settle", "abc", "edge-cases"]);
    assert_eq!(output.status.code(), Some(64));
    assert!(stderr(&output).contains("invalid duration value: abc"));
}

#[test]
fn unknown_subcommand_fails_argument_parsing() {
    let output = servoprobe(&["dance"]);
    assert_eq!(output.status.code(), Some(2));
}
