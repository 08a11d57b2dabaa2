//! Integration tests for Configuration System

use super::test_utils::EnvGuard;
use resman::config::{ConfigLoader, ResmanConfig};
use resman::remote::UrlStrategy;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_defaults_without_any_file() {
    let _env = EnvGuard::new();
    let temp_dir = TempDir::new().unwrap();

    let config = ConfigLoader::load(temp_dir.path()).unwrap();
    assert_eq!(config, ResmanConfig::default());
    assert!(config.validate().is_ok());
}

#[test]
fn test_workspace_file_then_environment_file_then_env_vars() {
    let env = EnvGuard::new();
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("resman.toml"),
        r#"
[resources]
root = "static/resources"

[remote]
account = "acct"
repository = "courses"
strategy = "download"

[verify]
concurrency = 3
"#,
    )
    .unwrap();
    fs::write(
        temp_dir.path().join("resman.production.toml"),
        "[verify]\nconcurrency = 16\n",
    )
    .unwrap();
    env.set("RESMAN_ENV", "production");
    env.set("RESMAN__REMOTE__BRANCH", "gh-pages");

    let config = ConfigLoader::load(temp_dir.path()).unwrap();
    assert_eq!(config.resources.root, "static/resources");
    assert_eq!(config.remote.strategy, UrlStrategy::Download);
    assert_eq!(config.verify.concurrency, 16);
    assert_eq!(config.remote.branch, "gh-pages");
    assert_eq!(
        config.resources.root_path(temp_dir.path()),
        temp_dir.path().join("static/resources")
    );
}

#[test]
fn test_global_file_is_layered_below_workspace() {
    let _env = EnvGuard::new();
    let global = ConfigLoader::global_config_path().unwrap();
    fs::create_dir_all(global.parent().unwrap()).unwrap();
    fs::write(&global, "[remote]\naccount = \"global-acct\"\nrepository = \"global-repo\"\n").unwrap();

    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("resman.toml"),
        "[remote]\nrepository = \"local-repo\"\n",
    )
    .unwrap();

    let config = ConfigLoader::load(temp_dir.path()).unwrap();
    assert_eq!(config.remote.account, "global-acct");
    assert_eq!(config.remote.repository, "local-repo");
}

#[test]
fn test_invalid_values_are_all_reported() {
    let _env = EnvGuard::new();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("custom.toml");
    fs::write(
        &path,
        r#"
[verify]
concurrency = 0
timeout_secs = 500

[logging]
output = "syslog"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&path).unwrap();
    let errors = config.validate().unwrap_err();
    assert!(errors.len() >= 3, "expected every problem listed: {:?}", errors);
    assert!(config.validated().is_err());
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let _env = EnvGuard::new();
    let temp_dir = TempDir::new().unwrap();
    assert!(ConfigLoader::load_from_file(&temp_dir.path().join("absent.toml")).is_err());
}
