//! BLAKE3 digests of whole directory trees
//!
//! Used to prove a backup copy is byte-for-byte identical to the resource
//! root before any rename touches the original.

use crate::error::StorageError;
use blake3::Hasher;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// 32-byte BLAKE3 digest
pub type Hash = [u8; 32];

/// Compute a digest over every entry below `root`.
///
/// digest = hash(for each entry sorted by path: kind || path_len || rel_path || content_hash)
///
/// The root's own name does not contribute, so a copy placed elsewhere
/// hashes identically.
pub fn compute_tree_digest(root: &Path) -> Result<Hash, StorageError> {
    let mut hasher = Hasher::new();

    for entry in WalkDir::new(root).min_depth(1).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to walk {:?}: {}", root, e),
            ))
        })?;
        let rel = entry.path().strip_prefix(root).map_err(|e| {
            StorageError::InvalidPath(format!("{:?} escapes {:?}: {}", entry.path(), root, e))
        })?;
        let rel_string = rel.to_string_lossy().replace('\\', "/");
        let rel_bytes = rel_string.as_bytes();

        let file_type = entry.file_type();
        let kind: &[u8] = if file_type.is_dir() {
            b"dir"
        } else if file_type.is_file() {
            b"file"
        } else {
            b"other"
        };

        hasher.update(kind);
        hasher.update(&(rel_bytes.len() as u64).to_be_bytes());
        hasher.update(rel_bytes);

        if file_type.is_file() {
            let content = fs::read(entry.path())?;
            hasher.update(&compute_content_hash(&content));
        } else if file_type.is_symlink() {
            let target = fs::read_link(entry.path())?;
            hasher.update(target.to_string_lossy().as_bytes());
        }
    }

    Ok(*hasher.finalize().as_bytes())
}

/// Compute content hash for file bytes
pub fn compute_content_hash(content: &[u8]) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(content);
    *hasher.finalize().as_bytes()
}
