//! Integration tests for the `adsync` CLI binary.
//!
//! Every test runs against a snapshot file inside a temporary directory,
//! with config and data directories pointed there as well.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const ROOT: &str = "DC=example,DC=com";

const PLAN: &str = r"
groups:
  - name: engineers
    gid: 7000
    description: Engineering
users:
  - username: alice
    first_name: Alice
    last_name: Smith
    password: placeholder
    posix:
      uid: 10001
      main_group: engineers
      login_shell: /bin/zsh
";

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `adsync` binary with env isolation.
///
/// Clears all `ADSYNC_*` env vars and points config and data directories
/// at `home` so tests never touch the user's real configuration.
fn adsync_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("adsync");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("ADSYNC_PROFILE")
        .env_remove("ADSYNC_ROOT")
        .env_remove("ADSYNC_SNAPSHOT")
        .env_remove("ADSYNC_OUTPUT");
    cmd
}

/// A temp home plus the snapshot path inside it.
fn workspace() -> (TempDir, PathBuf) {
    let home = tempfile::tempdir().unwrap();
    let snapshot = home.path().join("directory.json");
    (home, snapshot)
}

/// `adsync --root <ROOT> --snapshot <snapshot>` ready for a subcommand.
fn directory_cmd(home: &Path, snapshot: &Path) -> assert_cmd::Command {
    let mut cmd = adsync_cmd(home);
    cmd.arg("--root").arg(ROOT).arg("--snapshot").arg(snapshot);
    cmd
}

fn init(home: &Path, snapshot: &Path) {
    directory_cmd(home, snapshot)
        .args(["snapshot", "init"])
        .assert()
        .success();
}

fn write_plan(home: &Path) -> PathBuf {
    let path = home.join("plan.yaml");
    std::fs::write(&path, PLAN).unwrap();
    path
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let (home, _) = workspace();
    let output = adsync_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let (home, _) = workspace();
    adsync_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("users")
            .and(predicate::str::contains("groups"))
            .and(predicate::str::contains("sync")),
    );
}

#[test]
fn test_version_flag() {
    let (home, _) = workspace();
    adsync_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("adsync"));
}

#[test]
fn test_completions_bash() {
    let (home, _) = workspace();
    adsync_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_invalid_subcommand() {
    let (home, _) = workspace();
    adsync_cmd(home.path())
        .arg("frobnicate")
        .assert()
        .failure()
        .code(2);
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn test_no_config_reports_path() {
    let (home, _) = workspace();
    let output = adsync_cmd(home.path())
        .args(["users", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(
        text.contains("No directory configured"),
        "Expected config error in output:\n{text}"
    );
}

#[test]
fn test_unknown_profile() {
    let (home, _) = workspace();
    let output = adsync_cmd(home.path())
        .args(["--profile", "prod", "users", "list"])
        .output()
        .unwrap();
    let text = combined_output(&output);
    assert!(text.contains("Profile 'prod' not found"), "{text}");
}

#[test]
fn test_missing_snapshot() {
    let (home, snapshot) = workspace();
    let output = directory_cmd(home.path(), &snapshot)
        .args(["users", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    let text = combined_output(&output);
    assert!(text.contains("No snapshot"), "{text}");
    assert!(text.contains("adsync snapshot init"), "{text}");
}

// ── Snapshot ────────────────────────────────────────────────────────

#[test]
fn test_snapshot_init_refuses_to_overwrite() {
    let (home, snapshot) = workspace();
    init(home.path(), &snapshot);

    directory_cmd(home.path(), &snapshot)
        .args(["snapshot", "init"])
        .assert()
        .failure()
        .code(6);

    directory_cmd(home.path(), &snapshot)
        .args(["snapshot", "init", "--force"])
        .assert()
        .success();
}

#[test]
fn test_fresh_snapshot_has_builtin_groups() {
    let (home, snapshot) = workspace();
    init(home.path(), &snapshot);

    directory_cmd(home.path(), &snapshot)
        .args(["groups", "list", "-o", "plain"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Domain Users").and(predicate::str::contains("Domain Admins")),
        );

    directory_cmd(home.path(), &snapshot)
        .args(["containers", "list", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CN=Users,DC=example,DC=com"));
}

// ── Sync ────────────────────────────────────────────────────────────

#[test]
fn test_sync_creates_planned_objects() {
    let (home, snapshot) = workspace();
    init(home.path(), &snapshot);
    let plan = write_plan(home.path());

    directory_cmd(home.path(), &snapshot)
        .args(["sync", "--yes", "--plan"])
        .arg(&plan)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("created: 2")
                .and(predicate::str::contains("CN=engineers,CN=Users,DC=example,DC=com"))
                .and(predicate::str::contains("CN=alice,CN=Users,DC=example,DC=com")),
        );

    let output = directory_cmd(home.path(), &snapshot)
        .args(["users", "list", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let users: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let alice = &users[0];
    assert_eq!(alice["username"], "alice");
    assert_eq!(alice["display_name"], "Alice Smith");
    assert_eq!(alice["primary_group"], "Domain Users");
    assert_eq!(alice["rid"], 1101);
    assert_eq!(alice["loaded"], true);
    assert_eq!(alice["posix"]["uid"], 10001);
    assert_eq!(alice["posix"]["main_group"], "engineers");

    // Everything is in the directory now; a second run has nothing to do.
    directory_cmd(home.path(), &snapshot)
        .args(["sync"])
        .assert()
        .success()
        .stdout(predicate::str::contains("created: 0"));
}

#[test]
fn test_dry_run_leaves_snapshot_untouched() {
    let (home, snapshot) = workspace();
    init(home.path(), &snapshot);
    let plan = write_plan(home.path());
    let before = std::fs::read_to_string(&snapshot).unwrap();

    directory_cmd(home.path(), &snapshot)
        .args(["sync", "--dry-run", "--plan"])
        .arg(&plan)
        .assert()
        .success()
        .stdout(predicate::str::contains("would create: 2"));

    assert_eq!(std::fs::read_to_string(&snapshot).unwrap(), before);
}

#[test]
fn test_sync_requires_yes_without_terminal() {
    let (home, snapshot) = workspace();
    init(home.path(), &snapshot);
    let plan = write_plan(home.path());

    let output = directory_cmd(home.path(), &snapshot)
        .args(["sync", "--plan"])
        .arg(&plan)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--yes"));
}

#[test]
fn test_plan_errors_are_reported() {
    let (home, snapshot) = workspace();
    init(home.path(), &snapshot);
    let plan = home.path().join("bad.yaml");
    std::fs::write(&plan, "users:\n  - username: bob\n    primary_group: Nowhere\n").unwrap();

    let output = directory_cmd(home.path(), &snapshot)
        .args(["sync", "--yes", "--plan"])
        .arg(&plan)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Nowhere"));
}

#[test]
fn test_user_show_not_found() {
    let (home, snapshot) = workspace();
    init(home.path(), &snapshot);

    let output = directory_cmd(home.path(), &snapshot)
        .args(["users", "show", "nobody"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("users list"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_is_under_config_home() {
    let (home, _) = workspace();
    adsync_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_use_unknown_profile() {
    let (home, _) = workspace();
    adsync_cmd(home.path())
        .args(["config", "use", "prod"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Profile 'prod' not found"));
}
