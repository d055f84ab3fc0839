//! Tests for the remexec binary: flags, exit codes and messages.

mod common;

use common::closed_port;
use common::mock_agent::{AgentScript, Frame, MockAgent};
use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

/// The binary with a clean environment, so no REMEXEC_* leaks in.
fn remexec_cmd() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_remexec"));
    cmd.env_clear();
    cmd
}

async fn run_blocking(mut cmd: Command) -> Output {
    tokio::task::spawn_blocking(move || cmd.output().expect("Failed to execute command"))
        .await
        .unwrap()
}

#[test]
fn test_help_lists_flags_and_environment() {
    let output = remexec_cmd()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--sdkid"));
    assert!(stdout.contains("--wait-timeout"));
    assert!(stdout.contains("ENVIRONMENT VARIABLES:"));
    assert!(stdout.contains("REMEXEC_PROJECT_ID"));
    assert!(stdout.contains("REMEXEC_SDK_ID"));
    assert!(stdout.contains("REMEXEC_LOG_FILE"));
}

#[test]
fn test_version_flag() {
    let output = remexec_cmd()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unreachable_agent_exits_with_one() {
    let port = closed_port();
    let output = remexec_cmd()
        .args(["--url", &format!("127.0.0.1:{}", port), "--id", "p1", "--", "make"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains(&format!("Cannot connect to http://127.0.0.1:{}", port)),
        "unexpected stderr: {}",
        stderr
    );
}

#[test]
fn test_missing_config_file_exits_with_one() {
    let output = remexec_cmd()
        .args(["-c", "/nonexistent/remexec.env", "--", "make"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("/nonexistent/remexec.env"));
    assert!(stderr.contains("not found"));
}

#[test]
fn test_invalid_log_level_exits_with_one() {
    let output = remexec_cmd()
        .args(["--log", "chatty", "--", "make"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("chatty"));
}

#[test]
fn test_unknown_flag_is_usage_error() {
    let output = remexec_cmd()
        .arg("--bogus")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--bogus"));
}

#[tokio::test]
async fn test_remote_exit_code_is_propagated() {
    let agent = MockAgent::start(AgentScript::with_frames(vec![
        Frame::output("t1", "hello\n", ""),
        Frame::output("t2", "", "oops\n"),
        Frame::exit(3, Some("command failed")),
    ]))
    .await;

    let mut cmd = remexec_cmd();
    cmd.args([
        "--url",
        &agent.host_port(),
        "--id",
        "p1",
        "--sdkid",
        "s1",
        "--",
        "make",
        "all",
    ]);
    let output = run_blocking(cmd).await;

    assert_eq!(output.status.code(), Some(3));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hello\n");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("oops\n"), "unexpected stderr: {}", stderr);
    assert!(stderr.contains("command failed"));
}

#[tokio::test]
async fn test_channel_close_exits_with_two() {
    let agent = MockAgent::start(AgentScript::with_frames(vec![Frame::Close(
        "boom".into(),
    )]))
    .await;

    let mut cmd = remexec_cmd();
    cmd.args(["--url", &agent.host_port(), "--id", "p1", "--", "make"]);
    let output = run_blocking(cmd).await;

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("boom"));
}

#[tokio::test]
async fn test_silent_agent_exits_with_two() {
    let agent = MockAgent::start(AgentScript {
        ping_interval_ms: 100,
        ping_timeout_ms: 200,
        answer_pings: false,
        ..Default::default()
    })
    .await;

    let mut cmd = remexec_cmd();
    cmd.args(["--url", &agent.host_port(), "--id", "p1", "--", "make"]);
    let output = run_blocking(cmd).await;

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ping timeout"));
}

#[tokio::test]
async fn test_missing_project_prints_help_and_exits_with_one() {
    let agent = MockAgent::start(AgentScript::default()).await;

    let mut cmd = remexec_cmd();
    cmd.args(["--url", &agent.host_port(), "--", "make"]);
    let output = run_blocking(cmd).await;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("REMEXEC_PROJECT_ID"));
    assert!(stderr.contains(r#"remexec --id "p1" --sdkid "s1""#));
    assert!(agent.requests_to("/api/v1/exec").await.is_empty());
}

#[tokio::test]
async fn test_list_prints_help_to_stdout_and_exits_with_zero() {
    let agent = MockAgent::start(AgentScript::default()).await;

    let mut cmd = remexec_cmd();
    cmd.args(["--url", &agent.host_port(), "--ls"]);
    let output = run_blocking(cmd).await;

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("List of existing projects"));
    assert!(stdout.contains("(default SDK: s1)"));
}

#[tokio::test]
async fn test_config_file_from_environment_supplies_parameters() {
    let agent = MockAgent::start(AgentScript::with_frames(vec![Frame::exit(0, None)])).await;

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "REMEXEC_PROJECT_ID=p1").unwrap();
    writeln!(file, "REMEXEC_SDK_ID=s1").unwrap();
    writeln!(file, "REMEXEC_AGENT_URL={}", agent.host_port()).unwrap();
    writeln!(file, "BUILD_TYPE=release").unwrap();

    let mut cmd = remexec_cmd();
    cmd.env("REMEXEC_CONFIG", file.path())
        .args(["--", "make"]);
    let output = run_blocking(cmd).await;

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let exec = agent.requests_to("/api/v1/exec").await;
    assert_eq!(exec.len(), 1);
    let body = exec[0].json();
    assert_eq!(body["id"], "p1");
    assert_eq!(body["sdkid"], "s1");
    let env = body["env"].as_array().unwrap();
    assert!(env.iter().any(|v| v == "BUILD_TYPE=release"));
}
