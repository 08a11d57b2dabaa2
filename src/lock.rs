//! Advisory locking of the resource root
//!
//! Renaming changes the ground truth that scans and local checks read, so a
//! rewrite holds an exclusive lock while readers hold shared ones. The lock
//! file sits next to the root (`<parent>/.<root-name>.lock`) so it never shows
//! up inside the scanned tree or its backups.

use crate::error::{ApiError, StorageError};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default time to wait for a held lock before giving up.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);

const RETRY_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Readers: scan, local verification
    Shared,
    /// Writers: rewrite
    Exclusive,
}

impl LockMode {
    fn as_str(self) -> &'static str {
        match self {
            LockMode::Shared => "shared",
            LockMode::Exclusive => "exclusive",
        }
    }
}

/// Held lock on a resource root; released on drop.
#[derive(Debug)]
pub struct RootLock {
    file: File,
    path: PathBuf,
    mode: LockMode,
}

impl RootLock {
    /// Acquire a lock on `root`, retrying until `wait` has elapsed.
    ///
    /// # Errors
    ///
    /// [`ApiError::LockHeld`] when another holder keeps the lock past `wait`;
    /// a storage error when the lock file cannot be opened.
    pub fn acquire(root: &Path, mode: LockMode, wait: Duration) -> Result<Self, ApiError> {
        let path = lock_path(root);
        let started = Instant::now();

        loop {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&path)
                .map_err(StorageError::from)?;

            let acquired = match mode {
                LockMode::Shared => FileExt::try_lock_shared(&file),
                LockMode::Exclusive => FileExt::try_lock_exclusive(&file),
            };

            match acquired {
                Ok(true) => {
                    if mode == LockMode::Exclusive {
                        if let Err(e) = record_holder(&file) {
                            debug!(lock = %path.display(), error = %e, "Failed to record lock holder");
                        }
                    }
                    debug!(lock = %path.display(), mode = mode.as_str(), "Acquired root lock");
                    return Ok(Self { file, path, mode });
                }
                Ok(false) | Err(_) if started.elapsed() < wait => {
                    std::thread::sleep(RETRY_INTERVAL);
                }
                Ok(false) | Err(_) => {
                    warn!(lock = %path.display(), mode = mode.as_str(), "Root lock is held elsewhere");
                    return Err(ApiError::LockHeld(root.to_path_buf()));
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for RootLock {
    fn drop(&mut self) {
        // The file stays on disk; removing it would race with waiting openers.
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(lock = %self.path.display(), error = %e, "Failed to release root lock");
        }
    }
}

/// `<parent>/.<root-name>.lock` for `root`.
pub fn lock_path(root: &Path) -> PathBuf {
    let resolved = dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let name = resolved
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "resources".to_string());
    let parent = match resolved.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    parent.join(format!(".{}.lock", name))
}

fn record_holder(file: &File) -> std::io::Result<()> {
    let mut handle = file;
    file.set_len(0)?;
    writeln!(
        handle,
        "pid={}\ntime={}",
        std::process::id(),
        chrono::Utc::now().to_rfc3339()
    )?;
    handle.flush()
}
