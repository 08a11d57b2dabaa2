//! Local existence check and the duplicated-prefix fix pass

use crate::error::{Defect, ResourceKind};
use crate::manifest::{fix_duplicated_roots, inspect, Manifest, PathFix};
use crate::tree::path;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Result of a local check
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalReport {
    pub ok: bool,
    pub subjects: usize,
    pub folders_missing: usize,
    pub documents_found: usize,
    pub documents_missing: usize,
    /// Folders and documents absent on disk
    pub missing: Vec<Defect>,
    /// Structural problems in the manifest itself
    pub errors: Vec<Defect>,
}

/// Check that every subject folder and document of `manifest` exists.
///
/// Relative folders resolve against `base`. A missing folder is one defect;
/// its documents are not listed individually. Structural defects (as found
/// by [`inspect`] against `root`) are reported alongside.
#[instrument(skip_all, fields(base = %base.display()))]
pub fn check_local(manifest: &Manifest, base: &Path, root: &str) -> LocalReport {
    let mut report = LocalReport {
        errors: inspect(manifest, root),
        ..LocalReport::default()
    };

    for subject in manifest.subjects() {
        report.subjects += 1;
        let folder = &subject.matiere.folder;
        let folder_path = path::resolve(base, folder);

        if !folder_path.is_dir() {
            warn!(folder = %folder, "Subject folder missing");
            report.folders_missing += 1;
            report.missing.push(Defect::MissingResource {
                resource: ResourceKind::Folder,
                path: folder.clone(),
            });
            continue;
        }

        for doc in &subject.matiere.pdfs {
            if folder_path.join(doc.name()).is_file() {
                report.documents_found += 1;
            } else {
                let doc_path = format!("{}/{}", folder.trim_end_matches('/'), doc.name());
                warn!(path = %doc_path, "Document missing");
                report.documents_missing += 1;
                report.missing.push(Defect::MissingResource {
                    resource: ResourceKind::Document,
                    path: doc_path,
                });
            }
        }
        debug!(subject = %subject.label(), "Checked subject");
    }

    report.ok = report.missing.is_empty() && report.errors.is_empty();
    info!(
        subjects = report.subjects,
        found = report.documents_found,
        missing = report.missing.len(),
        structural = report.errors.len(),
        "Local check complete"
    );
    report
}

/// Result of the fix pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixReport {
    pub ok: bool,
    /// Structural defects present before fixing
    pub found: Vec<Defect>,
    pub fixes: Vec<PathFix>,
    /// Local check re-run on the corrected manifest
    pub recheck: LocalReport,
}

/// Repair duplicated prefixes of folders that disagree with their ancestors,
/// in place, then re-run the local check.
pub fn fix_paths(manifest: &mut Manifest, base: &Path, root: &str) -> FixReport {
    let found = inspect(manifest, root);
    let fixes = fix_duplicated_roots(manifest, root);
    if fixes.is_empty() {
        info!("No duplicated folder prefixes found");
    }
    let recheck = check_local(manifest, base, root);
    FixReport {
        ok: recheck.ok,
        found,
        fixes,
        recheck,
    }
}
