//! Folder string helpers: joining, normalization, and prefix defects
//!
//! Manifest folders are stored as `/`-separated strings regardless of platform,
//! so these helpers work on strings and only touch the filesystem in
//! [`same_entry`].

use crate::error::StorageError;
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Normalize a root or folder string: NFC, `/` separators, no trailing slash
/// (except a bare root), no `./` prefix.
pub fn normalize_path_string(path: &str) -> String {
    let normalized: String = path.nfc().collect();
    let mut result = normalized.replace('\\', "/");

    while result.starts_with("./") {
        result.drain(..2);
    }
    if result.len() > 1 {
        while result.ends_with('/') {
            result.pop();
        }
    }
    result
}

/// Root string for a filesystem path, as used in manifest folders.
pub fn root_string(root: &Path) -> Result<String, StorageError> {
    let raw = root.to_str().ok_or_else(|| {
        StorageError::InvalidPath(format!("Resource root is not valid UTF-8: {:?}", root))
    })?;
    Ok(normalize_path_string(raw))
}

/// `folder` for a subject: root joined with the three ancestor names.
pub fn join_folder(root: &str, filiere: &str, semestre: &str, matiere: &str) -> String {
    if root.is_empty() {
        return format!("{}/{}/{}", filiere, semestre, matiere);
    }
    let root = root.trim_end_matches('/');
    format!("{}/{}/{}/{}", root, filiere, semestre, matiere)
}

fn segments(folder: &str) -> Vec<&str> {
    folder.split('/').filter(|s| !s.is_empty() && *s != ".").collect()
}

/// Detect a duplicated leading segment run and return the corrected folder.
///
/// `assets/assets/x` -> `assets/x`; `a/b/a/b/x` -> `a/b/x`. Only one layer is
/// removed per call; callers loop until `None` to peel nested repeats.
pub fn duplicated_prefix(folder: &str) -> Option<String> {
    let parts = segments(folder);
    let absolute = folder.starts_with('/');
    for k in 1..=parts.len() / 2 {
        if parts[..k] == parts[k..2 * k] {
            let rest = parts[k..].join("/");
            return Some(if absolute { format!("/{}", rest) } else { rest });
        }
    }
    None
}

/// Repeatedly strip duplicated prefixes until the folder is stable.
pub fn strip_duplicated_prefixes(folder: &str) -> String {
    let mut current = folder.to_string();
    while let Some(next) = duplicated_prefix(&current) {
        current = next;
    }
    current
}

/// True when `folder` lies under `root` (segment-wise, not string-prefix).
pub fn is_under_root(folder: &str, root: &str) -> bool {
    let root_parts = segments(root);
    let folder_parts = segments(folder);
    folder.starts_with('/') == root.starts_with('/')
        && folder_parts.len() > root_parts.len()
        && folder_parts[..root_parts.len()] == root_parts[..]
}

/// Remove the leading `prefix` segments from `folder`, if present.
pub fn strip_leading(folder: &str, prefix: &str) -> String {
    let prefix_parts = segments(prefix);
    let folder_parts = segments(folder);
    if prefix_parts.is_empty()
        || folder_parts.len() < prefix_parts.len()
        || folder_parts[..prefix_parts.len()] != prefix_parts[..]
    {
        return folder.to_string();
    }
    folder_parts[prefix_parts.len()..].join("/")
}

/// Resolve a manifest folder against the workspace base directory.
pub fn resolve(base: &Path, folder: &str) -> PathBuf {
    let folder_path = Path::new(folder);
    if folder_path.is_absolute() {
        folder_path.to_path_buf()
    } else {
        base.join(folder_path)
    }
}

/// True when both paths name the same existing filesystem entry.
///
/// Case-only renames on case-insensitive filesystems see the target as
/// already existing; this tells that apart from a genuine clash.
pub fn same_entry(a: &Path, b: &Path) -> bool {
    match (dunce::canonicalize(a), dunce::canonicalize(b)) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => false,
    }
}
