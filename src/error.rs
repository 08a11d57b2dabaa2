//! Error types for the resource manifest system.
//!
//! Errors here abort an operation. Problems found *while* an operation runs
//! (missing files, broken links, failed renames) are [`Defect`] values carried
//! inside reports instead.

use crate::manifest::Flavor;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Failed to parse manifest {path:?}: {message}")]
    ManifestParse { path: PathBuf, message: String },

    #[error("Failed to write manifest {path:?}: {message}")]
    ManifestWrite { path: PathBuf, message: String },

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Top-level error returned by services and the CLI
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Backup failed, nothing was renamed: {0}")]
    BackupFailed(String),

    #[error("Resource root {0:?} is locked by another operation")]
    LockHeld(PathBuf),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Manifest {path:?} is the {found} flavor; {expected} is required")]
    WrongFlavor {
        path: PathBuf,
        expected: Flavor,
        found: Flavor,
    },
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

/// Kind of local resource a [`Defect::MissingResource`] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Folder,
    Document,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Folder => write!(f, "folder"),
            ResourceKind::Document => write!(f, "document"),
        }
    }
}

/// A defect found while scanning, rewriting or verifying a manifest.
///
/// Defects never abort a pass: they accumulate into the operation's report so
/// one run gives the full inventory.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Defect {
    /// Manifest content that contradicts the layout rules (duplicated root
    /// segment, folder outside the root, duplicate names).
    #[error("structural defect at {location}: {detail}")]
    StructuralDefect {
        location: String,
        detail: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        suggested_fix: Option<String>,
    },

    #[error("missing {resource}: {path}")]
    MissingResource { resource: ResourceKind, path: String },

    #[error("rename {from} -> {to} failed: {error}")]
    RenameFailure {
        from: String,
        to: String,
        error: String,
    },

    #[error("{document} unreachable at {url}: {reason}")]
    RemoteUnreachable {
        document: String,
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
        reason: String,
    },

    /// The URL answered 2xx but served a large-object pointer stub.
    #[error("{document} at {url} serves a storage pointer, not the file content")]
    IndirectionPointerDetected { document: String, url: String },
}

impl Defect {
    /// Stable short label used by table output.
    pub fn label(&self) -> &'static str {
        match self {
            Defect::StructuralDefect { .. } => "StructuralDefect",
            Defect::MissingResource { .. } => "MissingResource",
            Defect::RenameFailure { .. } => "RenameFailure",
            Defect::RemoteUnreachable { .. } => "RemoteUnreachable",
            Defect::IndirectionPointerDetected { .. } => "IndirectionPointerDetected",
        }
    }
}
