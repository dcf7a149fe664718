//! Binary-level tests

use crate::support::serve;
use assert_cmd::{cargo::cargo_bin_cmd, Command};
use predicates::prelude::*;
use tempfile::TempDir;

/// Command isolated from the user's config and state
fn precache(temp: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("precache");
    cmd.env_remove("RUST_LOG")
        .env("PRECACHE_CONFIG", temp.path().join("config.toml"))
        .env("PRECACHE_STATE_DIR", temp.path().join("state"));
    cmd
}

fn write_config(temp: &TempDir, scope: &str) {
    let config = format!(
        "[worker]\ncache_name = \"app-cache-v1\"\nscope = \"{}\"\nmanifest = [\"/\", \"index.html\", \"manifest.json\"]\n\n[network]\ntimeout_secs = 5\n",
        scope
    );
    std::fs::write(temp.path().join("config.toml"), config).unwrap();
}

fn state_file(temp: &TempDir, name: &str) -> bool {
    temp.path().join("state").join(name).exists()
}

#[test]
fn help_displays() {
    let temp = TempDir::new().unwrap();
    precache(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Offline-first precaching proxy"));
}

#[test]
fn version_displays() {
    let temp = TempDir::new().unwrap();
    precache(&temp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("precache"));
}

#[test]
fn config_path() {
    let temp = TempDir::new().unwrap();
    precache(&temp)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_show_defaults() {
    let temp = TempDir::new().unwrap();
    precache(&temp)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[worker]").and(predicate::str::contains("app-cache-v1")));
}

#[test]
fn config_init_writes_file() {
    let temp = TempDir::new().unwrap();
    precache(&temp)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration initialized"));
    assert!(temp.path().join("config.toml").exists());

    precache(&temp)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn invalid_config_reports_hint() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.toml"), "[worker]\nscope = \"nope\"\n").unwrap();

    precache(&temp)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"))
        .stderr(predicate::str::contains("config init --force"));

    precache(&temp)
        .args(["config", "init", "--force"])
        .assert()
        .success();
}

#[test]
fn status_without_registration() {
    let temp = TempDir::new().unwrap();
    precache(&temp)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No active registration"));
}

#[test]
fn cache_list_empty() {
    let temp = TempDir::new().unwrap();
    precache(&temp)
        .args(["cache", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No caches found"));
}

#[test]
fn cache_show_missing() {
    let temp = TempDir::new().unwrap();
    precache(&temp)
        .args(["cache", "show", "app-cache-v0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cache not found"));
}

#[test]
fn register_unreachable_fails() {
    let temp = TempDir::new().unwrap();
    write_config(&temp, "http://127.0.0.1:9/");

    precache(&temp)
        .arg("register")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Install failed"));
    assert!(!state_file(&temp, "registration.json"));
}

#[test]
fn fetch_without_registration_uses_network() {
    let temp = TempDir::new().unwrap();
    write_config(&temp, "http://127.0.0.1:9/");

    precache(&temp)
        .args(["fetch", "index.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Network error"));
}

#[test]
fn fetch_rejects_malformed_header() {
    let temp = TempDir::new().unwrap();
    write_config(&temp, "http://127.0.0.1:9/");

    precache(&temp)
        .args(["fetch", "index.html", "-H", "no-colon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid header 'no-colon'"));
}

#[test]
fn register_then_fetch_offline() {
    let temp = TempDir::new().unwrap();
    let (scope, server) = serve(3);
    write_config(&temp, &scope);

    precache(&temp)
        .arg("register")
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed app-cache-v1 (3 entries)"))
        .stdout(predicate::str::contains("Activated"));

    // The server has answered the three manifest requests and is gone now
    let paths = server.join().unwrap();
    assert_eq!(paths, vec!["/", "/index.html", "/manifest.json"]);
    assert!(state_file(&temp, "registration.json"));

    precache(&temp)
        .args(["fetch", "index.html"])
        .assert()
        .success()
        .stdout(predicate::str::diff("body of /index.html"))
        .stderr(predicate::str::contains("cache"));

    // Equivalent spellings of a cached URL match the same entry
    let dotted = format!("{}./manifest.json#top", scope.replace("http://", "HTTP://"));
    precache(&temp)
        .args(["fetch", &dotted, "-H", "Accept: application/json"])
        .assert()
        .success()
        .stdout(predicate::str::diff("body of /manifest.json"))
        .stderr(predicate::str::contains("cache"));

    precache(&temp)
        .args(["fetch", "other.js"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Network error"));

    precache(&temp)
        .args(["status", "--format", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::diff("app-cache-v1\n"));

    precache(&temp)
        .args(["cache", "list", "--format", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::diff("app-cache-v1\n"));

    precache(&temp)
        .args(["cache", "clear", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cleared 1 cache(s)"));
    assert!(!state_file(&temp, "registration.json"));
}
