//! Full-copy backups of the resource root

use crate::error::ApiError;
use crate::tree::hasher::{self, Hash};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

/// A verified backup copy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Backup {
    pub path: PathBuf,
    /// Hex BLAKE3 tree digest, identical for source and copy
    pub digest: String,
    pub files: usize,
}

/// Copy `root` to a sibling directory and verify the copy.
///
/// The backup lives at `<parent>/<root-name>.<suffix>-<UTC timestamp>`. The
/// copy is accepted only when its tree digest equals the source digest; any
/// failure is [`ApiError::BackupFailed`] and the caller must not mutate.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn create_backup(root: &Path, suffix: &str) -> Result<Backup, ApiError> {
    let root = dunce::canonicalize(root)
        .map_err(|e| ApiError::BackupFailed(format!("cannot resolve {:?}: {}", root, e)))?;
    let parent = root
        .parent()
        .ok_or_else(|| ApiError::BackupFailed(format!("{:?} has no parent directory", root)))?;
    let name = root
        .file_name()
        .ok_or_else(|| ApiError::BackupFailed(format!("{:?} has no directory name", root)))?
        .to_string_lossy()
        .to_string();

    let target = unique_backup_path(parent, &name, suffix);
    let source_digest = hasher::compute_tree_digest(&root)
        .map_err(|e| ApiError::BackupFailed(format!("cannot hash source: {}", e)))?;

    let files = copy_tree(&root, &target)
        .map_err(|e| ApiError::BackupFailed(format!("copy to {:?} failed: {}", target, e)))?;

    let backup_digest = hasher::compute_tree_digest(&target)
        .map_err(|e| ApiError::BackupFailed(format!("cannot hash backup: {}", e)))?;
    if backup_digest != source_digest {
        return Err(ApiError::BackupFailed(format!(
            "backup {:?} differs from source (digest {} != {})",
            target,
            hex::encode(backup_digest),
            hex::encode(source_digest)
        )));
    }

    info!(backup = %target.display(), files, "Backup created and verified");
    Ok(Backup {
        path: target,
        digest: hex_digest(&source_digest),
        files,
    })
}

pub fn hex_digest(digest: &Hash) -> String {
    hex::encode(digest)
}

fn unique_backup_path(parent: &Path, name: &str, suffix: &str) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%3fZ");
    let base = format!("{}.{}-{}", name, suffix, stamp);
    let mut candidate = parent.join(&base);
    let mut counter = 1;
    while candidate.exists() {
        candidate = parent.join(format!("{}-{}", base, counter));
        counter += 1;
    }
    candidate
}

/// Recursive copy; returns the number of files copied.
fn copy_tree(source: &Path, target: &Path) -> std::io::Result<usize> {
    fs::create_dir_all(target)?;
    let mut files = 0;

    for entry in WalkDir::new(source).min_depth(1).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
        let dest = target.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&dest)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &dest)?;
            files += 1;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &dest)?;
        }
        debug!(path = %dest.display(), "Backed up entry");
    }

    Ok(files)
}

#[cfg(unix)]
fn copy_symlink(source: &Path, dest: &Path) -> std::io::Result<()> {
    let link_target = fs::read_link(source)?;
    std::os::unix::fs::symlink(link_target, dest)
}

#[cfg(not(unix))]
fn copy_symlink(source: &Path, _dest: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        format!("cannot back up symlink {:?} on this platform", source),
    ))
}
