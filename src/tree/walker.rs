//! Three-level resource tree scanner
//!
//! Walks `root/<filiere>/<semestre>/<matiere>/*.pdf` one level at a time and
//! builds the canonical manifest. Every level is listed with a stable
//! file-name sort so two scans of the same tree produce identical output.

use crate::error::StorageError;
use crate::manifest::{Document, Filiere, Manifest, ManifestCounts, Matiere, Semestre};
use crate::tree::path;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use walkdir::{DirEntry, WalkDir};

/// Scanner configuration
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Whether to follow symbolic links (default: false for determinism)
    pub follow_symlinks: bool,
    /// Entry names skipped at every level (e.g. ".git")
    pub ignore_patterns: Vec<String>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            ignore_patterns: vec![".git".to_string()],
        }
    }
}

/// An entry the scanner could not represent in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub path: String,
    pub reason: String,
}

/// Result of a scan: the manifest plus anything that was left out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub manifest: Manifest,
    pub counts: ManifestCounts,
    pub skipped: Vec<SkippedEntry>,
}

/// Builds a manifest from the resource tree on disk.
pub struct TreeScanner {
    root: PathBuf,
    root_label: Option<String>,
    config: WalkerConfig,
}

impl TreeScanner {
    /// Scanner for `root`; folders in the manifest start with `root` as given.
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            root_label: None,
            config: WalkerConfig::default(),
        }
    }

    /// Create a scanner with custom configuration
    pub fn with_config(root: PathBuf, config: WalkerConfig) -> Self {
        Self {
            root,
            root_label: None,
            config,
        }
    }

    /// Read from `self.root` but write `label` as the folder prefix.
    ///
    /// Used when the physical root is resolved against a workspace while the
    /// manifest keeps the configured, workspace-relative root.
    pub fn with_root_label(mut self, label: impl Into<String>) -> Self {
        self.root_label = Some(label.into());
        self
    }

    /// Scan the tree.
    ///
    /// Empty branches are pruned: a subject needs a PDF, a semestre a subject,
    /// a filière a semestre. Unreadable or non-UTF-8 entries below the root
    /// are reported in [`ScanOutcome::skipped`]; only an unreadable root is an
    /// error.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn scan(&self) -> Result<ScanOutcome, StorageError> {
        let started = Instant::now();
        if !self.root.is_dir() {
            return Err(StorageError::InvalidPath(format!(
                "Resource root {:?} is not a directory",
                self.root
            )));
        }
        let label = match &self.root_label {
            Some(label) => path::normalize_path_string(label),
            None => path::root_string(&self.root)?,
        };

        let mut skipped = Vec::new();
        let mut manifest = Manifest::default();

        let filiere_entries = self.list_level(&self.root, &mut skipped).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to list resource root {:?}: {}", self.root, e),
            ))
        })?;

        for (filiere_name, filiere_path) in self.directories(filiere_entries, &mut skipped) {
            let mut filiere = Filiere {
                name: filiere_name,
                semestres: Vec::new(),
            };

            let semestre_entries = self.list_or_skip(&filiere_path, &mut skipped);
            for (semestre_name, semestre_path) in self.directories(semestre_entries, &mut skipped) {
                let mut semestre = Semestre {
                    name: semestre_name,
                    matieres: Vec::new(),
                };

                let matiere_entries = self.list_or_skip(&semestre_path, &mut skipped);
                for (matiere_name, matiere_path) in
                    self.directories(matiere_entries, &mut skipped)
                {
                    let pdfs = self.documents(&matiere_path, &mut skipped);
                    if pdfs.is_empty() {
                        debug!(path = %matiere_path.display(), "Pruning subject without PDFs");
                        continue;
                    }
                    let folder =
                        path::join_folder(&label, &filiere.name, &semestre.name, &matiere_name);
                    semestre.matieres.push(Matiere {
                        name: matiere_name,
                        folder,
                        pdfs,
                    });
                }

                if !semestre.matieres.is_empty() {
                    filiere.semestres.push(semestre);
                }
            }

            if !filiere.semestres.is_empty() {
                manifest.filieres.push(filiere);
            }
        }

        for entry in &skipped {
            warn!(path = %entry.path, reason = %entry.reason, "Skipped entry during scan");
        }
        let counts = manifest.counts();
        info!(
            filieres = counts.filieres,
            matieres = counts.matieres,
            documents = counts.documents,
            skipped = skipped.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Scan complete"
        );

        Ok(ScanOutcome {
            manifest,
            counts,
            skipped,
        })
    }

    /// List the direct children of `dir`, sorted by raw file name.
    fn list_level(
        &self,
        dir: &Path,
        skipped: &mut Vec<SkippedEntry>,
    ) -> Result<Vec<DirEntry>, walkdir::Error> {
        let mut entries = Vec::new();
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        for entry in walker {
            match entry {
                Ok(entry) if self.should_ignore(&entry) => {}
                Ok(entry) => entries.push(entry),
                // Failure on the directory itself (depth 0) means nothing is listable
                Err(e) if e.depth() == 0 => return Err(e),
                Err(e) => skipped.push(SkippedEntry {
                    path: e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| dir.display().to_string()),
                    reason: e.to_string(),
                }),
            }
        }
        Ok(entries)
    }

    fn list_or_skip(&self, dir: &Path, skipped: &mut Vec<SkippedEntry>) -> Vec<DirEntry> {
        match self.list_level(dir, skipped) {
            Ok(entries) => entries,
            Err(e) => {
                skipped.push(SkippedEntry {
                    path: dir.display().to_string(),
                    reason: format!("unreadable directory: {}", e),
                });
                Vec::new()
            }
        }
    }

    /// Keep directories only, as (utf-8 name, path) pairs.
    fn directories(
        &self,
        entries: Vec<DirEntry>,
        skipped: &mut Vec<SkippedEntry>,
    ) -> Vec<(String, PathBuf)> {
        entries
            .into_iter()
            .filter(|e| e.file_type().is_dir())
            .filter_map(|e| match e.file_name().to_str() {
                Some(name) => Some((name.to_string(), e.into_path())),
                None => {
                    skipped.push(non_utf8(e.path()));
                    None
                }
            })
            .collect()
    }

    /// PDF files directly inside a subject folder.
    fn documents(&self, dir: &Path, skipped: &mut Vec<SkippedEntry>) -> Vec<Document> {
        let entries = self.list_or_skip(dir, skipped);
        let mut pdfs = Vec::new();
        for entry in entries {
            if !entry.file_type().is_file() || !is_pdf(entry.path()) {
                continue;
            }
            match entry.file_name().to_str() {
                Some(name) => pdfs.push(Document::Local(name.to_string())),
                None => skipped.push(non_utf8(entry.path())),
            }
        }
        pdfs
    }

    fn should_ignore(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        self.config
            .ignore_patterns
            .iter()
            .any(|pattern| name == pattern.as_str())
    }
}

/// Case-insensitive `.pdf` suffix check on the file name.
///
/// A bare `.pdf` counts: it has no extension as far as [`Path::extension`]
/// is concerned, but sanitizing an all-non-ASCII stem produces exactly that.
pub fn is_pdf(path: &Path) -> bool {
    const SUFFIX: &str = ".pdf";
    path.file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| {
            let start = name.len().checked_sub(SUFFIX.len())?;
            name.get(start..).map(|tail| tail.eq_ignore_ascii_case(SUFFIX))
        })
        .unwrap_or(false)
}

fn non_utf8(path: &Path) -> SkippedEntry {
    SkippedEntry {
        path: path.display().to_string(),
        reason: "name is not valid UTF-8".to_string(),
    }
}
