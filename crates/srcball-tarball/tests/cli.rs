//! Command-line behaviour of `create-tarball` that needs no network access.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn create_tarball(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_create-tarball"))
        .args(args)
        .current_dir(cwd)
        .env_remove("SRCBALL_CACHE")
        .env_remove("SRCBALL_LAYOUT")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run create-tarball")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_help() {
    let dir = TempDir::new().unwrap();
    let output = create_tarball(dir.path(), &["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--l10n-base-repo"));
    assert!(stdout.contains("--locale-blacklist"));
}

#[test]
fn test_repo_and_name_are_required() {
    let dir = TempDir::new().unwrap();
    let output = create_tarball(dir.path(), &["-n", "firefox"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("--repo"));
}

#[test]
fn test_l10n_base_required_with_default_layout() {
    let dir = TempDir::new().unwrap();
    let output = create_tarball(
        dir.path(),
        &["-r", "https://hg.example.org/releases/mozilla-release", "-n", "firefox"],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Must specify a base repository for l10n data"));
}

#[test]
fn test_missing_blacklist_rejected() {
    let dir = TempDir::new().unwrap();
    let output = create_tarball(
        dir.path(),
        &[
            "-r",
            "https://hg.example.org/releases/mozilla-release",
            "-n",
            "firefox",
            "-l",
            "https://hg.example.org/l10n",
            "-b",
            "no-such-blacklist",
        ],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Locale blacklist file does not exist"));
    // Nothing was started.
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_bad_layout_exits_with_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("layout.toml"), "no_such_field = 1\n").unwrap();
    let output = create_tarball(
        dir.path(),
        &[
            "-r",
            "https://hg.example.org/comm-central",
            "-n",
            "thunderbird",
            "--layout",
            "layout.toml",
        ],
    );
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.starts_with("error: failed to load layout layout.toml"));
    assert!(err.contains("Invalid source layout"));
}

#[test]
fn test_layout_without_all_locales_needs_no_l10n_base() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("layout.toml"),
        "all_locales = \"\"\nsource_dir = \"\"\n",
    )
    .unwrap();
    // The layout is rejected for its empty source_dir, not for the missing
    // l10n base.
    let output = create_tarball(
        dir.path(),
        &["-r", "https://hg.example.org/repo", "-n", "pkg", "--layout", "layout.toml"],
    );
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("source_dir must not be empty"));
    assert!(!err.contains("l10n"));
}
