//! Derived manifest flavors

use crate::manifest::Manifest;
use crate::tree::path;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Persisted manifest variants. Only `Local` is canonical; the others are
/// snapshots derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flavor {
    /// Root-relative local paths, bare filenames (canonical)
    Local,
    /// Folders relative to the web asset base (root's parent stripped)
    Web,
    /// Documents carry resolved remote URLs
    Remote,
}

impl std::fmt::Display for Flavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flavor::Local => write!(f, "local"),
            Flavor::Web => write!(f, "web"),
            Flavor::Remote => write!(f, "remote"),
        }
    }
}

/// Parent of the resource root, or `None` when stripping it would be a no-op.
fn root_parent(root: &str) -> Option<String> {
    let root = path::normalize_path_string(root);
    Path::new(&root)
        .parent()
        .and_then(|p| p.to_str())
        .map(path::normalize_path_string)
        .filter(|parent| !parent.is_empty() && parent != "/")
}

/// Root as it appears in web-flavor folders (`assets/resources` -> `resources`).
pub fn web_root(root: &str) -> String {
    let normalized = path::normalize_path_string(root);
    match root_parent(&normalized) {
        Some(parent) => path::strip_leading(&normalized, &parent),
        None => normalized,
    }
}

/// Derive the web-relative flavor: folders lose the resource root's parent
/// prefix, so `assets/resources/x` becomes `resources/x`.
///
/// A root without a parent (`resources`) leaves folders untouched.
pub fn web_flavor(manifest: &Manifest, root: &str) -> Manifest {
    let mut web = manifest.clone();
    let Some(parent) = root_parent(root) else {
        return web;
    };
    for matiere in web.matieres_mut() {
        matiere.folder = path::strip_leading(&matiere.folder, &parent);
    }
    web
}
