//! Two-phase canonical renaming of the resource tree
//!
//! Plan: compute every sanitized name and the rename operations, touching
//! nothing. Apply: back up the whole root, then rename leaves first
//! (documents, subjects, semestres, filières) so no pending path from the plan
//! is invalidated by a parent rename. The first failed rename stops the pass;
//! the verified backup is always left in place.

use crate::error::{ApiError, Defect};
use crate::manifest::{Document, Filiere, Manifest, ManifestStore, Matiere, Semestre};
use crate::tree::backup::{self, Backup};
use crate::tree::path;
use crate::tree::sanitize::sanitize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

/// What a rename operation moves; also its apply order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenameKind {
    Document,
    Matiere,
    Semestre,
    Filiere,
}

/// One planned rename. `from` and `to` share a parent as it exists when the
/// operation runs, i.e. ancestors still carry their old names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameOp {
    pub kind: RenameKind,
    pub location: String,
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Output of the plan phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewritePlan {
    /// Effective renames, leaves first
    pub ops: Vec<RenameOp>,
    /// Entities whose name is already canonical
    pub unchanged: usize,
    /// Siblings that would collapse onto one name
    pub conflicts: Vec<Defect>,
    /// The manifest as it will read once every rename succeeded
    pub tree: Manifest,
}

impl RewritePlan {
    /// Plan a rewrite of `tree` whose files live under `fs_root`; folders in
    /// the new tree are prefixed with `root_label`.
    pub fn build(tree: &Manifest, fs_root: &Path, root_label: &str) -> RewritePlan {
        let root_label = path::normalize_path_string(root_label);
        let mut planner = Planner::default();
        let mut new_tree = Manifest::default();

        planner.check_siblings("<root>", tree.filieres.iter().map(|f| f.name.as_str()));
        for filiere in &tree.filieres {
            let new_filiere_name = sanitize(&filiere.name);
            let filiere_path = fs_root.join(&filiere.name);
            let mut new_filiere = Filiere {
                name: new_filiere_name.clone(),
                semestres: Vec::new(),
            };

            planner.check_siblings(&filiere.name, filiere.semestres.iter().map(|s| s.name.as_str()));
            for semestre in &filiere.semestres {
                let new_semestre_name = sanitize(&semestre.name);
                let semestre_path = filiere_path.join(&semestre.name);
                let semestre_label = format!("{}/{}", filiere.name, semestre.name);
                let mut new_semestre = Semestre {
                    name: new_semestre_name.clone(),
                    matieres: Vec::new(),
                };

                planner.check_siblings(
                    &semestre_label,
                    semestre.matieres.iter().map(|m| m.name.as_str()),
                );
                for matiere in &semestre.matieres {
                    let new_matiere_name = sanitize(&matiere.name);
                    let matiere_path = semestre_path.join(&matiere.name);
                    let matiere_label = format!("{}/{}", semestre_label, matiere.name);

                    planner.check_siblings(&matiere_label, matiere.pdfs.iter().map(|d| d.name()));
                    let mut pdfs = Vec::with_capacity(matiere.pdfs.len());
                    for doc in &matiere.pdfs {
                        let new_doc_name = sanitize(doc.name());
                        planner.push(
                            RenameKind::Document,
                            format!("{}/{}", matiere_label, doc.name()),
                            matiere_path.join(doc.name()),
                            matiere_path.join(&new_doc_name),
                        );
                        pdfs.push(Document::Local(new_doc_name));
                    }
                    pdfs.sort_by(|a, b| a.name().cmp(b.name()));

                    planner.push(
                        RenameKind::Matiere,
                        matiere_label,
                        matiere_path.clone(),
                        semestre_path.join(&new_matiere_name),
                    );
                    new_semestre.matieres.push(Matiere {
                        folder: path::join_folder(
                            &root_label,
                            &new_filiere_name,
                            &new_semestre_name,
                            &new_matiere_name,
                        ),
                        name: new_matiere_name,
                        pdfs,
                    });
                }
                new_semestre.matieres.sort_by(|a, b| a.name.cmp(&b.name));

                planner.push(
                    RenameKind::Semestre,
                    semestre_label,
                    semestre_path.clone(),
                    filiere_path.join(&new_semestre_name),
                );
                new_filiere.semestres.push(new_semestre);
            }
            new_filiere.semestres.sort_by(|a, b| a.name.cmp(&b.name));

            planner.push(
                RenameKind::Filiere,
                filiere.name.clone(),
                filiere_path.clone(),
                fs_root.join(&new_filiere_name),
            );
            new_tree.filieres.push(new_filiere);
        }
        new_tree.filieres.sort_by(|a, b| a.name.cmp(&b.name));

        // Stable sort keeps traversal order within a kind
        planner.ops.sort_by_key(|op| op.kind);

        RewritePlan {
            ops: planner.ops,
            unchanged: planner.unchanged,
            conflicts: planner.conflicts,
            tree: new_tree,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.ops.is_empty()
    }
}

#[derive(Default)]
struct Planner {
    ops: Vec<RenameOp>,
    unchanged: usize,
    conflicts: Vec<Defect>,
}

impl Planner {
    fn push(&mut self, kind: RenameKind, location: String, from: PathBuf, to: PathBuf) {
        if from == to {
            self.unchanged += 1;
            return;
        }
        self.ops.push(RenameOp {
            kind,
            location,
            from,
            to,
        });
    }

    /// Two siblings whose sanitized names collide cannot both be renamed.
    fn check_siblings<'a>(&mut self, parent: &str, names: impl Iterator<Item = &'a str>) {
        let mut by_target: BTreeMap<String, Vec<&'a str>> = BTreeMap::new();
        for name in names {
            by_target.entry(sanitize(name)).or_default().push(name);
        }
        for (target, sources) in by_target {
            if sources.len() > 1 {
                self.conflicts.push(Defect::StructuralDefect {
                    location: parent.to_string(),
                    detail: format!("{:?} all sanitize to {:?}", sources, target),
                    suggested_fix: None,
                });
            }
        }
    }
}

/// Overall result of a rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteStatus {
    /// Every rename applied (or nothing needed renaming)
    Completed,
    /// Plan had collisions; nothing was touched
    Conflicted,
    /// A rename failed; earlier renames stay applied, the backup holds the original
    Aborted,
}

/// Rename as recorded in reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRecord {
    pub kind: RenameKind,
    pub from: String,
    pub to: String,
}

impl From<&RenameOp> for RenameRecord {
    fn from(op: &RenameOp) -> Self {
        Self {
            kind: op.kind,
            from: op.from.display().to_string(),
            to: op.to.display().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteReport {
    pub status: RewriteStatus,
    pub ok: bool,
    pub planned: usize,
    pub renamed: usize,
    pub unchanged: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<Backup>,
    pub applied: Vec<RenameRecord>,
    /// Renames not attempted because an earlier one failed
    pub pending: Vec<RenameRecord>,
    pub defects: Vec<Defect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<PathBuf>,
}

pub struct RewriteOutcome {
    /// The rewritten manifest; only authoritative when `report.ok`
    pub tree: Manifest,
    pub report: RewriteReport,
}

/// Applies sanitized names to disk and manifest as one unit.
pub struct TreeRewriter {
    root: PathBuf,
    root_label: String,
    backup_suffix: String,
    persist_to: Option<PathBuf>,
}

impl TreeRewriter {
    pub fn new(root: PathBuf, root_label: impl Into<String>) -> Self {
        Self {
            root,
            root_label: root_label.into(),
            backup_suffix: "backup".to_string(),
            persist_to: None,
        }
    }

    pub fn with_backup_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.backup_suffix = suffix.into();
        self
    }

    /// Save the new manifest here after a successful pass.
    pub fn persist_to(mut self, manifest_path: PathBuf) -> Self {
        self.persist_to = Some(manifest_path);
        self
    }

    /// Plan only.
    pub fn plan(&self, tree: &Manifest) -> RewritePlan {
        RewritePlan::build(tree, &self.root, &self.root_label)
    }

    /// Plan, back up, and apply.
    ///
    /// Returns `Err` only when the backup cannot be created and verified; in
    /// that case nothing was renamed. Every other outcome, including a failed
    /// rename, is described by the returned report.
    #[instrument(skip_all, fields(root = %self.root.display()))]
    pub fn rewrite(&self, tree: &Manifest) -> Result<RewriteOutcome, ApiError> {
        let plan = self.plan(tree);
        let planned = plan.ops.len();

        if !plan.conflicts.is_empty() {
            warn!(conflicts = plan.conflicts.len(), "Rewrite plan has name collisions");
            return Ok(RewriteOutcome {
                tree: tree.clone(),
                report: RewriteReport {
                    status: RewriteStatus::Conflicted,
                    ok: false,
                    planned,
                    renamed: 0,
                    unchanged: plan.unchanged,
                    backup: None,
                    applied: Vec::new(),
                    pending: plan.ops.iter().map(RenameRecord::from).collect(),
                    defects: plan.conflicts,
                    manifest_path: None,
                },
            });
        }

        let backup = backup::create_backup(&self.root, &self.backup_suffix)?;

        let mut applied = Vec::new();
        let mut defects = Vec::new();
        let mut failed_at = None;
        for (index, op) in plan.ops.iter().enumerate() {
            match apply_rename(op) {
                Ok(()) => {
                    debug!(from = %op.from.display(), to = %op.to.display(), "Renamed");
                    applied.push(RenameRecord::from(op));
                }
                Err(reason) => {
                    error!(
                        from = %op.from.display(),
                        to = %op.to.display(),
                        error = %reason,
                        backup = %backup.path.display(),
                        "Rename failed, stopping"
                    );
                    defects.push(Defect::RenameFailure {
                        from: op.from.display().to_string(),
                        to: op.to.display().to_string(),
                        error: reason,
                    });
                    failed_at = Some(index);
                    break;
                }
            }
        }

        if let Some(index) = failed_at {
            return Ok(RewriteOutcome {
                tree: plan.tree,
                report: RewriteReport {
                    status: RewriteStatus::Aborted,
                    ok: false,
                    planned,
                    renamed: applied.len(),
                    unchanged: plan.unchanged,
                    backup: Some(backup),
                    applied,
                    pending: plan.ops[index + 1..].iter().map(RenameRecord::from).collect(),
                    defects,
                    manifest_path: None,
                },
            });
        }

        let mut manifest_path = None;
        if let Some(target) = &self.persist_to {
            match ManifestStore::save(&plan.tree, target) {
                Ok(()) => manifest_path = Some(target.clone()),
                Err(e) => {
                    error!(path = %target.display(), error = %e, "Renames applied but manifest not saved");
                    defects.push(Defect::StructuralDefect {
                        location: target.display().to_string(),
                        detail: format!("manifest not saved after renaming: {}", e),
                        suggested_fix: None,
                    });
                }
            }
        }

        info!(
            renamed = applied.len(),
            unchanged = plan.unchanged,
            backup = %backup.path.display(),
            "Rewrite complete"
        );
        Ok(RewriteOutcome {
            tree: plan.tree,
            report: RewriteReport {
                status: RewriteStatus::Completed,
                ok: defects.is_empty(),
                planned,
                renamed: applied.len(),
                unchanged: plan.unchanged,
                backup: Some(backup),
                applied,
                pending: Vec::new(),
                defects,
                manifest_path,
            },
        })
    }
}

/// Rename one entry without ever replacing a different existing entry.
fn apply_rename(op: &RenameOp) -> Result<(), String> {
    if fs::symlink_metadata(&op.from).is_err() {
        return Err("source does not exist".to_string());
    }
    if fs::symlink_metadata(&op.to).is_ok() && !path::same_entry(&op.from, &op.to) {
        return Err("target already exists".to_string());
    }
    fs::rename(&op.from, &op.to).map_err(|e| e.to_string())
}
