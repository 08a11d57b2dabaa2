//! Shared test utilities for integration tests
//!
//! Resource tree fixtures and a guard that serializes access to the
//! process environment, which configuration loading reads.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Environment variables a test may override; restored on drop.
const TRACKED_VARS: [&str; 4] = [
    "XDG_CONFIG_HOME",
    "RESMAN_ENV",
    "RESMAN__REMOTE__BRANCH",
    "RESMAN__VERIFY__CONCURRENCY",
];

pub struct EnvGuard {
    saved: Vec<(&'static str, Option<String>)>,
    _config_home: TempDir,
    _lock: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Lock the environment and point the global config directory at an empty temp dir.
    pub fn new() -> Self {
        let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let saved = TRACKED_VARS
            .iter()
            .map(|name| (*name, std::env::var(name).ok()))
            .collect();
        let config_home = TempDir::new().unwrap();
        std::env::set_var("XDG_CONFIG_HOME", config_home.path());
        for name in &TRACKED_VARS[1..] {
            std::env::remove_var(name);
        }
        Self {
            saved,
            _config_home: config_home,
            _lock: lock,
        }
    }

    pub fn set(&self, name: &str, value: &str) {
        std::env::set_var(name, value);
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (name, value) in &self.saved {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }
}

/// Create `root/<rel>` with PDF-looking content, parents included.
pub fn write_pdf(root: &Path, rel: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, format!("%PDF-1.4 {}", rel)).unwrap();
    path
}

/// Workspace with `assets/resources` holding the given files, plus a
/// `resman.toml` with remote coordinates.
pub fn workspace_with(files: &[&str]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("assets/resources");
    fs::create_dir_all(&root).unwrap();
    for rel in files {
        write_pdf(&root, rel);
    }
    fs::write(
        temp_dir.path().join("resman.toml"),
        r#"
[resources]
root = "assets/resources"

[remote]
account = "acct"
repository = "courses"
branch = "main"
"#,
    )
    .unwrap();
    temp_dir
}
