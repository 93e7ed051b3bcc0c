//! End-to-end tests for the `trellis` binary.

use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// The binary, isolated from the user's config and package manager.
fn trellis(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("trellis");
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("npm_config_user_agent")
        .env_remove("TRELLIS_FRAMEWORKS_DIR")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let temp = TempDir::new().unwrap();
    trellis(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn version_flag() {
    let temp = TempDir::new().unwrap();
    trellis(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn no_color_env_accepts_conventional_values() {
    let temp = TempDir::new().unwrap();
    for value in ["1", "true", "yes", ""] {
        trellis(temp.path())
            .env("NO_COLOR", value)
            .args(["list", "--frameworks", "--format", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("react"))
            .stdout(predicate::str::contains("\u{1b}[").not());
    }
}

#[test]
fn list_add_ons_as_json() {
    let temp = TempDir::new().unwrap();
    let assert = trellis(temp.path())
        .args(["list", "--format", "json", "--chosen", "query-demo"])
        .assert()
        .success();

    let rows: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    let rows = rows.as_array().unwrap();
    let query = rows.iter().find(|r| r["id"] == "tanstack-query").unwrap();
    assert_eq!(query["status"]["selected"], true);
    assert_eq!(query["status"]["depended_upon"], true);
}

#[test]
fn list_frameworks() {
    let temp = TempDir::new().unwrap();
    trellis(temp.path())
        .args(["list", "--frameworks", "--format", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("react"));
}

#[test]
fn dry_run_writes_nothing() {
    let temp = TempDir::new().unwrap();
    trellis(temp.path())
        .args(["create", "my-app", "--add-ons", "tanstack-query", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("package.json"))
        .stdout(predicate::str::contains("src/integrations/tanstack-query/root-provider.tsx"));

    assert!(!temp.path().join("my-app").exists());
}

#[test]
fn dry_run_with_attribution_names_sources() {
    let temp = TempDir::new().unwrap();
    trellis(temp.path())
        .args([
            "create",
            "my-app",
            "--add-ons",
            "tanstack-query",
            "--dry-run",
            "--attribution",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("TanStack Query"))
        .stdout(predicate::str::contains("@tanstack/react-query"));
}

#[test]
fn create_writes_project_and_config() {
    let temp = TempDir::new().unwrap();
    trellis(temp.path())
        .args([
            "create",
            "my-app",
            "--add-ons",
            "tanstack-query",
            "--no-git",
            "--no-install",
        ])
        .assert()
        .success();

    let project = temp.path().join("my-app");
    assert!(project.join("package.json").is_file());
    assert!(project.join("src/main.tsx").is_file());
    assert!(project.join(".gitignore").is_file());

    let config = fs::read_to_string(project.join(".trellis.json")).unwrap();
    assert!(config.contains("tanstack-query"));
    assert!(config.contains("\"projectName\": \"my-app\""));
}

#[test]
fn create_refuses_non_empty_target() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("my-app")).unwrap();
    fs::write(temp.path().join("my-app/keep.txt"), "x").unwrap();

    trellis(temp.path())
        .args(["create", "my-app", "--no-git", "--no-install"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn add_extends_an_existing_project() {
    let temp = TempDir::new().unwrap();
    trellis(temp.path())
        .args(["create", "my-app", "--no-git", "--no-install"])
        .assert()
        .success();

    trellis(temp.path())
        .args(["add", "tanstack-store", "--no-install", "-C", "my-app"])
        .assert()
        .success();

    let project = temp.path().join("my-app");
    assert!(project.join("src/lib/demo-store.ts").is_file());
    let package = fs::read_to_string(project.join("package.json")).unwrap();
    assert!(package.contains("@tanstack/react-store"));
    let config = fs::read_to_string(project.join(".trellis.json")).unwrap();
    assert!(config.contains("tanstack-store"));
}

#[test]
fn completions_for_bash() {
    let temp = TempDir::new().unwrap();
    trellis(temp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("trellis"));
}

#[test]
fn init_local_writes_config() {
    let temp = TempDir::new().unwrap();
    trellis(temp.path())
        .args(["init", "--local"])
        .assert()
        .success();

    let raw = fs::read_to_string(temp.path().join("trellis.toml")).unwrap();
    assert!(raw.contains("[defaults]"));
}

#[test]
fn local_config_supplies_defaults() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("trellis.toml"),
        "[defaults]\npackage_manager = \"pnpm\"\n",
    )
    .unwrap();

    trellis(temp.path())
        .args(["config", "get", "defaults.package_manager"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pnpm"));
}
