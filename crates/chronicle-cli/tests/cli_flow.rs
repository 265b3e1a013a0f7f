//! End-to-end CLI flows driven through the compiled binary.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const PASSWORD: &str = "cli-flow-password-123";

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_chronicle"))
}

fn run(data_dir: &Path, password: &str, args: &[&str]) -> Output {
    Command::new(bin())
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .env("CHRONICLE_PASSWORD", password)
        .output()
        .expect("binary should run")
}

fn init(data_dir: &Path, password: &str) -> Output {
    run(
        data_dir,
        password,
        &[
            "init",
            "--capture-binary",
            "/bin/cat",
            "--block",
            "signal",
        ],
    )
}

#[test]
fn init_creates_vault_and_config() {
    let dir = TempDir::new().unwrap();

    let output = init(dir.path(), PASSWORD);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    assert!(dir.path().join("master.key").exists());
    assert!(dir.path().join("config.toml").exists());

    let config = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(config.contains("/bin/cat"));
    assert!(config.contains("signal"));
}

#[test]
fn init_is_idempotent_but_rejects_a_wrong_password() {
    let dir = TempDir::new().unwrap();

    assert!(init(dir.path(), PASSWORD).status.success());
    let again = init(dir.path(), PASSWORD);
    assert!(again.status.success());
    assert!(String::from_utf8_lossy(&again.stdout).contains("already initialized"));

    let wrong = init(dir.path(), "wrong-password-456");
    assert!(!wrong.status.success());
}

#[test]
fn status_reports_uninitialized_then_initialized() {
    let dir = TempDir::new().unwrap();

    let before = run(dir.path(), PASSWORD, &["status"]);
    assert!(before.status.success());
    assert!(String::from_utf8_lossy(&before.stdout).contains("not initialized"));

    assert!(init(dir.path(), PASSWORD).status.success());

    let after = run(dir.path(), PASSWORD, &["status"]);
    assert!(after.status.success());
    let stdout = String::from_utf8_lossy(&after.stdout);
    assert!(stdout.contains("initialized"));
    assert!(!stdout.contains("not initialized"));
}

#[test]
fn show_on_a_fresh_install_prints_an_empty_transcript() {
    let dir = TempDir::new().unwrap();
    assert!(init(dir.path(), PASSWORD).status.success());

    let output = run(dir.path(), PASSWORD, &["show"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(output.stdout.is_empty());

    let json = run(dir.path(), PASSWORD, &["show", "--json"]);
    assert!(json.status.success());
    assert_eq!(String::from_utf8_lossy(&json.stdout).trim(), "[]");
}

#[test]
fn show_with_a_wrong_password_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    assert!(init(dir.path(), PASSWORD).status.success());

    let output = run(dir.path(), "wrong-password-456", &["show"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Incorrect password"));
}

#[test]
fn show_rejects_an_invalid_since_window() {
    let dir = TempDir::new().unwrap();
    assert!(init(dir.path(), PASSWORD).status.success());

    let output = run(dir.path(), PASSWORD, &["show", "--since", "yesterday"]);
    assert!(!output.status.success());
}
