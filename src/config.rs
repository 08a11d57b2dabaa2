//! Configuration System
//!
//! Layered configuration read once per invocation: built-in defaults, a global
//! user file, workspace files, then environment overrides. The resulting
//! [`ResmanConfig`] is passed explicitly to every component.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::remote::{RemoteCoordinates, UrlStrategy};
use crate::verify::RemoteCheckOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResmanConfig {
    #[serde(default)]
    pub resources: ResourcesConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub verify: VerifyConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the resource tree and its manifests live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesConfig {
    /// Resource root as written into manifest folders
    #[serde(default = "default_root")]
    pub root: String,

    /// Canonical manifest
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,

    /// Web-relative flavor
    #[serde(default = "default_web_manifest")]
    pub web_manifest: PathBuf,

    /// Remote-URL flavor
    #[serde(default = "default_remote_manifest")]
    pub remote_manifest: PathBuf,

    /// Backup directories are named `<root>.<suffix>-<timestamp>`
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,

    /// Entry names the scanner skips at every level
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
}

fn default_root() -> String {
    "assets/resources".to_string()
}

fn default_manifest() -> PathBuf {
    PathBuf::from("assets/resources_manifest.json")
}

fn default_web_manifest() -> PathBuf {
    PathBuf::from("assets/resources_manifest_web.json")
}

fn default_remote_manifest() -> PathBuf {
    PathBuf::from("assets/resources_manifest_online.json")
}

fn default_backup_suffix() -> String {
    "backup".to_string()
}

fn default_ignore() -> Vec<String> {
    vec![".git".to_string()]
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            manifest: default_manifest(),
            web_manifest: default_web_manifest(),
            remote_manifest: default_remote_manifest(),
            backup_suffix: default_backup_suffix(),
            ignore: default_ignore(),
        }
    }
}

impl ResourcesConfig {
    /// Filesystem location of the root inside `workspace`.
    pub fn root_path(&self, workspace: &Path) -> PathBuf {
        workspace.join(&self.root)
    }

    fn validate(&self) -> Result<(), String> {
        if self.root.trim().is_empty() {
            return Err("root cannot be empty".to_string());
        }
        for (key, path) in [
            ("manifest", &self.manifest),
            ("web_manifest", &self.web_manifest),
            ("remote_manifest", &self.remote_manifest),
        ] {
            if path.as_os_str().is_empty() {
                return Err(format!("{} path cannot be empty", key));
            }
        }
        if self.backup_suffix.trim().is_empty() || self.backup_suffix.contains(['/', '\\']) {
            return Err(format!(
                "backup_suffix {:?} must be a non-empty single path segment",
                self.backup_suffix
            ));
        }
        if let Some(bad) = self
            .ignore
            .iter()
            .find(|name| name.trim().is_empty() || name.contains(['/', '\\']))
        {
            return Err(format!("ignore entry {:?} must be a single entry name", bad));
        }
        Ok(())
    }
}

/// Hosting coordinates for URL resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub account: String,

    #[serde(default)]
    pub repository: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default = "default_strategy")]
    pub strategy: UrlStrategy,

    #[serde(default = "default_raw_host")]
    pub raw_host: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_media_host")]
    pub media_host: String,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_strategy() -> UrlStrategy {
    UrlStrategy::Media
}

fn default_raw_host() -> String {
    "raw.githubusercontent.com".to_string()
}

fn default_host() -> String {
    "github.com".to_string()
}

fn default_media_host() -> String {
    "media.githubusercontent.com".to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            account: String::new(),
            repository: String::new(),
            branch: default_branch(),
            strategy: default_strategy(),
            raw_host: default_raw_host(),
            host: default_host(),
            media_host: default_media_host(),
        }
    }
}

impl RemoteConfig {
    pub fn coordinates(&self) -> RemoteCoordinates {
        RemoteCoordinates {
            account: self.account.clone(),
            repository: self.repository.clone(),
            branch: self.branch.clone(),
            raw_host: self.raw_host.clone(),
            host: self.host.clone(),
            media_host: self.media_host.clone(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        for (key, host) in [
            ("raw_host", &self.raw_host),
            ("host", &self.host),
            ("media_host", &self.media_host),
        ] {
            if host.trim().is_empty() || host.contains('/') {
                return Err(format!("{} {:?} must be a bare host name", key, host));
            }
        }
        Ok(())
    }
}

/// Remote verification limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-probe timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts for transient network failures
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Budget for the whole remote pass
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,

    /// Bytes fetched to look for a storage pointer
    #[serde(default = "default_pointer_probe_bytes")]
    pub pointer_probe_bytes: usize,
}

fn default_concurrency() -> usize {
    8
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_retries() -> u32 {
    1
}

fn default_deadline_secs() -> u64 {
    300
}

fn default_pointer_probe_bytes() -> usize {
    256
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            deadline_secs: default_deadline_secs(),
            pointer_probe_bytes: default_pointer_probe_bytes(),
        }
    }
}

impl VerifyConfig {
    pub fn options(&self) -> RemoteCheckOptions {
        RemoteCheckOptions {
            concurrency: self.concurrency,
            timeout: Duration::from_secs(self.timeout_secs),
            retries: self.retries,
            deadline: Duration::from_secs(self.deadline_secs),
        }
    }

    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.concurrency == 0 {
            errors.push("concurrency must be at least 1".to_string());
        }
        if !(1..=120).contains(&self.timeout_secs) {
            errors.push(format!(
                "timeout_secs must be between 1 and 120 (got {})",
                self.timeout_secs
            ));
        }
        if self.retries > 5 {
            errors.push(format!("retries must be at most 5 (got {})", self.retries));
        }
        if self.deadline_secs < self.timeout_secs {
            errors.push(format!(
                "deadline_secs ({}) must not be shorter than timeout_secs ({})",
                self.deadline_secs, self.timeout_secs
            ));
        }
        if self.pointer_probe_bytes < crate::remote::LFS_POINTER_MAGIC.len() {
            errors.push(format!(
                "pointer_probe_bytes must be at least {}",
                crate::remote::LFS_POINTER_MAGIC.len()
            ));
        }
        errors
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Resources(String),
    Remote(String),
    Verify(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Resources(msg) => write!(f, "resources: {}", msg),
            ValidationError::Remote(msg) => write!(f, "remote: {}", msg),
            ValidationError::Verify(msg) => write!(f, "verify: {}", msg),
            ValidationError::Logging(msg) => write!(f, "logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ResmanConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.resources.validate() {
            errors.push(ValidationError::Resources(e));
        }
        if let Err(e) = self.remote.validate() {
            errors.push(ValidationError::Remote(e));
        }
        errors.extend(self.verify.validate().into_iter().map(ValidationError::Verify));
        if let Err(e) = crate::logging::validate_format(&self.logging.format) {
            errors.push(ValidationError::Logging(e.to_string()));
        }
        if let Err(e) = crate::logging::validate_output(&self.logging.output) {
            errors.push(ValidationError::Logging(e.to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// [`validate`](Self::validate) folded into one `ApiError`.
    pub fn validated(self) -> Result<Self, ApiError> {
        self.validate().map_err(|errors| {
            ApiError::ConfigError(
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;
        Ok(self)
    }

    /// Effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render configuration: {}", e)))
    }
}
