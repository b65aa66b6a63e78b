//! End-to-End Tests for the eyerest binary.
//!
//! These tests run the compiled binary:
//! - Help, version and completion output
//! - Argument validation
//! - Commands failing cleanly without a daemon
//! - A real daemon process driven by CLI commands

use std::path::{Path, PathBuf};
use std::process::{Child, Command as StdCommand, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

use assert_cmd::Command;
use predicates::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn eyerest() -> Command {
    let mut cmd = Command::cargo_bin("eyerest").unwrap();
    cmd.env_remove("EYEREST_SOCKET").env("RUST_LOG", "off");
    cmd
}

/// Daemon child process, killed when dropped.
struct DaemonProcess {
    child: Child,
    socket_path: PathBuf,
    _dir: tempfile::TempDir,
}

impl DaemonProcess {
    fn spawn() -> Self {
        Self::spawn_with(&["--no-voice"])
    }

    fn spawn_with(daemon_args: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("e2e.sock");
        let child = StdCommand::new(assert_cmd::cargo::cargo_bin("eyerest"))
            .arg("daemon")
            .args(daemon_args)
            .arg("--socket")
            .arg(&socket_path)
            .env("RUST_LOG", "off")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while !socket_path.exists() {
            assert!(Instant::now() < deadline, "daemon did not create its socket");
            sleep(Duration::from_millis(20));
        }

        Self {
            child,
            socket_path,
            _dir: dir,
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = eyerest();
        cmd.args(args).arg("--socket").arg(&self.socket_path);
        cmd
    }

    /// Sends SIGTERM, waits for the process to exit and reports whether
    /// the socket file is still there.
    fn terminate(mut self) -> (std::process::ExitStatus, bool) {
        StdCommand::new("kill")
            .args(["-TERM", &self.child.id().to_string()])
            .status()
            .unwrap();
        let status = self.child.wait().unwrap();
        (status, self.socket_path.exists())
    }
}

impl Drop for DaemonProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn missing_socket(dir: &Path) -> PathBuf {
    dir.join("absent.sock")
}

// ============================================================================
// Help and Completions
// ============================================================================

#[test]
fn help_lists_commands() {
    eyerest()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("20-20-20"))
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("pause"))
        .stdout(predicate::str::contains("stop"))
        .stdout(predicate::str::contains("say"));
}

#[test]
fn version_flag() {
    eyerest()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("eyerest "));
}

#[test]
fn short_help_names_the_rule() {
    eyerest()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("20-20-20"));
}

#[test]
fn completions_for_bash() {
    eyerest()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("eyerest"));
}

// ============================================================================
// Argument Validation
// ============================================================================

#[test]
fn unknown_command_fails() {
    eyerest().arg("snooze").assert().failure();
}

#[test]
fn say_rejects_empty_text() {
    let dir = tempfile::tempdir().unwrap();
    eyerest()
        .args(["say", ""])
        .arg("--socket")
        .arg(missing_socket(dir.path()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty"));
}

// ============================================================================
// No Daemon
// ============================================================================

#[test]
fn status_without_daemon_fails() {
    let dir = tempfile::tempdir().unwrap();
    eyerest()
        .arg("status")
        .arg("--socket")
        .arg(missing_socket(dir.path()))
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("error: "))
        .stderr(predicate::str::contains("eyerest daemon"));
}

#[test]
fn socket_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    let socket = missing_socket(dir.path());
    eyerest()
        .arg("start")
        .env("EYEREST_SOCKET", &socket)
        .assert()
        .failure()
        .stderr(predicate::str::contains("daemon"));
}

// ============================================================================
// With Daemon
// ============================================================================

#[test]
fn daemon_session_flow() {
    let daemon = DaemonProcess::spawn();

    daemon
        .command(&["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("20:00"))
        .stdout(predicate::str::contains("Ready"))
        .stdout(predicate::str::contains("Press play to start"));

    daemon
        .command(&["start"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Timer started"));

    daemon
        .command(&["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Work"))
        .stdout(predicate::str::contains("State: running"));

    daemon
        .command(&["pause"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Timer paused"));

    daemon
        .command(&["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("State: paused"));

    daemon
        .command(&["stop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ready 20:00"));
}

#[test]
fn daemon_say_without_voice() {
    let daemon = DaemonProcess::spawn();

    daemon
        .command(&["say", "Blink"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Speech is not available"));
}

#[test]
fn daemon_speaks_through_voice_command() {
    let daemon = DaemonProcess::spawn_with(&["--voice-command", "true"]);

    daemon
        .command(&["say", "Blink"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Speaking"));
}

#[test]
fn daemon_removes_socket_on_sigterm() {
    let daemon = DaemonProcess::spawn();
    daemon.command(&["start"]).assert().success();

    let (status, socket_left_behind) = daemon.terminate();

    assert!(status.success());
    assert!(!socket_left_behind);
}
