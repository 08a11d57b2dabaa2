//! Manifest persistence and structural inspection

use crate::error::{Defect, StorageError};
use crate::manifest::Manifest;
use serde::{Deserialize, Serialize};
use crate::tree::path;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Loads and saves whole manifests as JSON.
///
/// The store never repairs what it reads; see [`inspect`] for defect detection.
pub struct ManifestStore;

impl ManifestStore {
    /// Load a manifest from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Manifest, StorageError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to read manifest from {:?}: {}", path, e),
            ))
        })?;
        let manifest: Manifest =
            serde_json::from_slice(&bytes).map_err(|e| StorageError::ManifestParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        debug!(path = %path.display(), subjects = manifest.subjects().count(), "Loaded manifest");
        Ok(manifest)
    }

    /// Load and report structural defects against `root` in one step.
    pub fn load_checked<P: AsRef<Path>>(
        path: P,
        root: &str,
    ) -> Result<(Manifest, Vec<Defect>), StorageError> {
        let manifest = Self::load(path)?;
        let defects = inspect(&manifest, root);
        for defect in &defects {
            warn!(%defect, "Manifest defect");
        }
        Ok((manifest, defects))
    }

    /// Save a manifest atomically (temp file + rename).
    pub fn save<P: AsRef<Path>>(manifest: &Manifest, path: P) -> Result<(), StorageError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StorageError::ManifestWrite {
                    path: path.to_path_buf(),
                    message: format!("Failed to create parent directory {:?}: {}", parent, e),
                })?;
            }
        }

        let mut serialized =
            serde_json::to_string_pretty(manifest).map_err(|e| StorageError::ManifestWrite {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        serialized.push('\n');

        let mut temp_name = path.as_os_str().to_os_string();
        temp_name.push(".tmp");
        let temp_path = Path::new(&temp_name);
        fs::write(temp_path, serialized.as_bytes()).map_err(|e| StorageError::ManifestWrite {
            path: temp_path.to_path_buf(),
            message: e.to_string(),
        })?;

        fs::rename(temp_path, path).map_err(|e| {
            let _ = fs::remove_file(temp_path);
            StorageError::ManifestWrite {
                path: path.to_path_buf(),
                message: format!("Failed to move temp file into place: {}", e),
            }
        })?;

        debug!(path = %path.display(), "Saved manifest");
        Ok(())
    }
}

/// Report structural defects of `manifest` relative to the resource `root`.
///
/// Detects duplicated root segments, folders outside the root, folders that
/// disagree with their ancestor names, and duplicate document names within a
/// subject. Nothing is modified.
pub fn inspect(manifest: &Manifest, root: &str) -> Vec<Defect> {
    let root = path::normalize_path_string(root);
    let mut defects = Vec::new();

    for subject in manifest.subjects() {
        let label = subject.label();
        let folder = subject.matiere.folder.as_str();
        let expected = path::join_folder(
            &root,
            &subject.filiere.name,
            &subject.semestre.name,
            &subject.matiere.name,
        );

        if path::normalize_path_string(folder) != expected {
            defects.push(folder_defect(label.clone(), folder, &root, expected));
        }

        let mut seen = HashSet::new();
        for doc in &subject.matiere.pdfs {
            if !seen.insert(doc.name()) {
                defects.push(Defect::StructuralDefect {
                    location: label.clone(),
                    detail: format!("document {:?} is listed more than once", doc.name()),
                    suggested_fix: None,
                });
            }
        }
    }

    defects
}

/// One folder correction made by [`fix_duplicated_roots`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathFix {
    pub location: String,
    pub from: String,
    pub to: String,
}

/// Strip duplicated leading segments from every `folder` that disagrees with
/// its ancestors, in place.
///
/// Repeats until each folder is stable, so `assets/assets/assets/x` becomes
/// `assets/x`. A folder already equal to `join(root, f, s, m)` is left alone
/// even when it repeats a segment (`res/res/s1/m` for a filière named `res`).
/// Returns one record per changed folder.
pub fn fix_duplicated_roots(manifest: &mut Manifest, root: &str) -> Vec<PathFix> {
    let root = path::normalize_path_string(root);
    let mut fixes = Vec::new();
    for filiere in &mut manifest.filieres {
        for semestre in &mut filiere.semestres {
            for matiere in &mut semestre.matieres {
                let expected =
                    path::join_folder(&root, &filiere.name, &semestre.name, &matiere.name);
                if path::normalize_path_string(&matiere.folder) == expected {
                    continue;
                }
                let fixed = path::strip_duplicated_prefixes(&matiere.folder);
                if fixed != matiere.folder {
                    info!(from = %matiere.folder, to = %fixed, "Fixed duplicated folder prefix");
                    fixes.push(PathFix {
                        location: format!("{}/{}/{}", filiere.name, semestre.name, matiere.name),
                        from: std::mem::replace(&mut matiere.folder, fixed.clone()),
                        to: fixed,
                    });
                }
            }
        }
    }
    fixes
}

fn folder_defect(location: String, folder: &str, root: &str, expected: String) -> Defect {
    if let Some(fixed) = path::duplicated_prefix(folder) {
        return Defect::StructuralDefect {
            location,
            detail: format!("folder {:?} repeats its leading segment", folder),
            suggested_fix: Some(path::strip_duplicated_prefixes(&fixed)),
        };
    }
    if !root.is_empty() && !path::is_under_root(folder, root) {
        return Defect::StructuralDefect {
            location,
            detail: format!("folder {:?} is outside the resource root {:?}", folder, root),
            suggested_fix: None,
        };
    }
    Defect::StructuralDefect {
        location,
        detail: format!(
            "folder {:?} does not match its ancestors (expected {:?})",
            folder, expected
        ),
        suggested_fix: Some(expected),
    }
}
