//! Catalog command service: one entry point per operation.
//!
//! Owns workflow logic (which manifest to read, which lock to take, where to
//! persist). The CLI parses, calls one method per command, and formats output.

use crate::config::ResmanConfig;
use crate::error::{ApiError, Defect};
use crate::lock::{LockMode, RootLock, DEFAULT_LOCK_WAIT};
use crate::manifest::{
    inspect, web_flavor, web_root, Flavor, Manifest, ManifestCounts, ManifestStore,
};
use crate::remote::{resolve_manifest, HttpProber, Prober, UrlStrategy};
use crate::tree::path;
use crate::tree::rewriter::{RewritePlan, RewriteReport, TreeRewriter};
use crate::tree::walker::{ScanOutcome, SkippedEntry, TreeScanner, WalkerConfig};
use crate::verify::{self, FixReport, LocalReport, RemoteCheckOptions, RemoteReport};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

/// Result of `generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateReport {
    pub ok: bool,
    pub counts: ManifestCounts,
    pub skipped: Vec<SkippedEntry>,
    pub defects: Vec<Defect>,
    pub manifest_path: PathBuf,
}

/// Result of `resolve-urls`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveReport {
    pub ok: bool,
    pub strategy: UrlStrategy,
    pub documents: usize,
    /// Structural defects in the source manifest; their URLs will not work
    pub defects: Vec<Defect>,
    pub manifest_path: PathBuf,
}

/// Result of `fix-paths`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixPathsReport {
    #[serde(flatten)]
    pub fix: FixReport,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<PathBuf>,
}

/// Result of `export-web`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    pub ok: bool,
    pub subjects: usize,
    pub documents: usize,
    pub manifest_path: PathBuf,
}

/// Result of `inspect`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectReport {
    pub ok: bool,
    pub flavor: Flavor,
    /// Root the folders were checked against
    pub root: String,
    pub counts: ManifestCounts,
    pub defects: Vec<Defect>,
    pub manifest_path: PathBuf,
}

/// Overrides for `verify-remote`
#[derive(Debug, Clone, Default)]
pub struct RemoteVerifyRequest {
    pub manifest: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
}

/// Runs catalog operations against one workspace.
pub struct CatalogService {
    workspace: PathBuf,
    config: ResmanConfig,
    lock_wait: Duration,
}

impl CatalogService {
    /// Service rooted at `workspace`; relative config paths resolve against it.
    pub fn new(workspace: impl Into<PathBuf>, config: ResmanConfig) -> Self {
        Self {
            workspace: workspace.into(),
            config,
            lock_wait: DEFAULT_LOCK_WAIT,
        }
    }

    /// How long to wait for a held root lock.
    pub fn with_lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait = wait;
        self
    }

    pub fn config(&self) -> &ResmanConfig {
        &self.config
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Filesystem path of the resource root.
    pub fn root_path(&self) -> PathBuf {
        self.config.resources.root_path(&self.workspace)
    }

    /// Root as written into manifest folders.
    pub fn root_label(&self) -> String {
        path::normalize_path_string(&self.config.resources.root)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.workspace.join(&self.config.resources.manifest)
    }

    pub fn web_manifest_path(&self) -> PathBuf {
        self.workspace.join(&self.config.resources.web_manifest)
    }

    pub fn remote_manifest_path(&self) -> PathBuf {
        self.workspace.join(&self.config.resources.remote_manifest)
    }

    fn lock(&self, mode: LockMode) -> Result<RootLock, ApiError> {
        RootLock::acquire(&self.root_path(), mode, self.lock_wait)
    }

    fn resolve_override(&self, path: Option<&Path>, default: PathBuf) -> PathBuf {
        path.map(|p| self.workspace.join(p)).unwrap_or(default)
    }

    fn scan(&self) -> Result<ScanOutcome, ApiError> {
        let config = WalkerConfig {
            ignore_patterns: self.config.resources.ignore.clone(),
            ..WalkerConfig::default()
        };
        let scanner =
            TreeScanner::with_config(self.root_path(), config).with_root_label(self.root_label());
        Ok(scanner.scan()?)
    }

    /// Scan the resource tree and save the canonical manifest.
    #[instrument(skip(self))]
    pub fn generate(&self) -> Result<GenerateReport, ApiError> {
        let outcome = {
            let _lock = self.lock(LockMode::Shared)?;
            self.scan()?
        };

        let manifest_path = self.manifest_path();
        ManifestStore::save(&outcome.manifest, &manifest_path)?;

        let defects: Vec<Defect> = outcome
            .skipped
            .iter()
            .map(|entry| Defect::StructuralDefect {
                location: entry.path.clone(),
                detail: format!("entry left out of the manifest: {}", entry.reason),
                suggested_fix: None,
            })
            .collect();

        info!(
            path = %manifest_path.display(),
            documents = outcome.counts.documents,
            "Manifest generated"
        );
        Ok(GenerateReport {
            ok: defects.is_empty(),
            counts: outcome.counts,
            skipped: outcome.skipped,
            defects,
            manifest_path,
        })
    }

    fn rewrite_source(&self, from_manifest: bool) -> Result<Manifest, ApiError> {
        if from_manifest {
            Ok(ManifestStore::load(self.manifest_path())?)
        } else {
            Ok(self.scan()?.manifest)
        }
    }

    fn rewriter(&self) -> TreeRewriter {
        TreeRewriter::new(self.root_path(), self.root_label())
            .with_backup_suffix(self.config.resources.backup_suffix.clone())
            .persist_to(self.manifest_path())
    }

    /// Compute the sanitizing rename plan without touching anything.
    #[instrument(skip(self))]
    pub fn plan_sanitize(&self, from_manifest: bool) -> Result<RewritePlan, ApiError> {
        let _lock = self.lock(LockMode::Shared)?;
        let tree = self.rewrite_source(from_manifest)?;
        Ok(self.rewriter().plan(&tree))
    }

    /// Back up the root, apply sanitized names, and save the new manifest.
    #[instrument(skip(self))]
    pub fn sanitize(&self, from_manifest: bool) -> Result<RewriteReport, ApiError> {
        let _lock = self.lock(LockMode::Exclusive)?;
        let tree = self.rewrite_source(from_manifest)?;
        Ok(self.rewriter().rewrite(&tree)?.report)
    }

    /// Derive and save the remote-URL flavor.
    #[instrument(skip(self))]
    pub fn resolve_urls(&self, strategy: Option<UrlStrategy>) -> Result<ResolveReport, ApiError> {
        let strategy = strategy.unwrap_or(self.config.remote.strategy);
        let coords = self.config.remote.coordinates();
        let missing = coords.missing_fields();
        if !missing.is_empty() {
            return Err(ApiError::ConfigError(format!(
                "URL resolution needs {}",
                missing.join(", ")
            )));
        }

        let (manifest, defects) =
            ManifestStore::load_checked(self.manifest_path(), &self.root_label())?;
        let remote = resolve_manifest(&manifest, strategy, &coords);
        let manifest_path = self.remote_manifest_path();
        ManifestStore::save(&remote, &manifest_path)?;

        let documents = remote.counts().documents;
        info!(%strategy, documents, path = %manifest_path.display(), "URLs resolved");
        Ok(ResolveReport {
            ok: defects.is_empty(),
            strategy,
            documents,
            defects,
            manifest_path,
        })
    }

    /// Check folders and documents of a manifest against the disk.
    #[instrument(skip(self))]
    pub fn verify_local(&self, manifest: Option<&Path>) -> Result<LocalReport, ApiError> {
        let manifest_path = self.resolve_override(manifest, self.manifest_path());
        let manifest = ManifestStore::load(&manifest_path)?;
        let _lock = self.lock(LockMode::Shared)?;
        Ok(verify::check_local(&manifest, &self.workspace, &self.root_label()))
    }

    /// Repair duplicated folder prefixes and re-check; saves unless `dry_run`.
    #[instrument(skip(self))]
    pub fn fix_paths(&self, manifest: Option<&Path>, dry_run: bool) -> Result<FixPathsReport, ApiError> {
        let manifest_path = self.resolve_override(manifest, self.manifest_path());
        let mut tree = ManifestStore::load(&manifest_path)?;

        let fix = {
            let _lock = self.lock(LockMode::Shared)?;
            verify::fix_paths(&mut tree, &self.workspace, &self.root_label())
        };

        let saved = if !dry_run && !fix.fixes.is_empty() {
            ManifestStore::save(&tree, &manifest_path)?;
            info!(path = %manifest_path.display(), fixes = fix.fixes.len(), "Saved corrected manifest");
            Some(manifest_path)
        } else {
            None
        };

        Ok(FixPathsReport {
            fix,
            dry_run,
            manifest_path: saved,
        })
    }

    /// Derive and save the web-relative flavor.
    #[instrument(skip(self))]
    pub fn export_web(&self, output: Option<&Path>) -> Result<ExportReport, ApiError> {
        let manifest = ManifestStore::load(self.manifest_path())?;
        let web = web_flavor(&manifest, &self.root_label());
        let manifest_path = self.resolve_override(output, self.web_manifest_path());
        ManifestStore::save(&web, &manifest_path)?;

        let counts = web.counts();
        Ok(ExportReport {
            ok: true,
            subjects: counts.matieres,
            documents: counts.documents,
            manifest_path,
        })
    }

    /// Effective remote check options after command-line overrides.
    pub fn remote_options(&self, request: &RemoteVerifyRequest) -> RemoteCheckOptions {
        let mut options = self.config.verify.options();
        if let Some(concurrency) = request.concurrency {
            options.concurrency = concurrency.max(1);
        }
        if let Some(timeout) = request.timeout_secs {
            options.timeout = Duration::from_secs(timeout.max(1));
        }
        options
    }

    /// Probe every URL of the remote manifest over HTTP.
    pub async fn verify_remote(&self, request: &RemoteVerifyRequest) -> Result<RemoteReport, ApiError> {
        let options = self.remote_options(request);
        let prober = HttpProber::new(options.timeout, self.config.verify.pointer_probe_bytes)?;
        self.verify_remote_with(request, &prober).await
    }

    /// Same as [`verify_remote`](Self::verify_remote) with a caller-supplied prober.
    pub async fn verify_remote_with<P>(
        &self,
        request: &RemoteVerifyRequest,
        prober: &P,
    ) -> Result<RemoteReport, ApiError>
    where
        P: Prober + ?Sized,
    {
        let manifest_path = self.resolve_override(request.manifest.as_deref(), self.remote_manifest_path());
        let manifest = ManifestStore::load(&manifest_path)?;
        let found = manifest.flavor_hint(&self.root_label());
        if found != Flavor::Remote && manifest.counts().documents > 0 {
            return Err(ApiError::WrongFlavor {
                path: manifest_path,
                expected: Flavor::Remote,
                found,
            });
        }
        let options = self.remote_options(request);
        Ok(verify::check_remote(&manifest, prober, &options).await)
    }

    /// Structural defects of a stored manifest; the tree on disk is not read.
    ///
    /// Web-flavor manifests are checked against the web root.
    #[instrument(skip(self))]
    pub fn inspect_manifest(&self, manifest: Option<&Path>) -> Result<InspectReport, ApiError> {
        let manifest_path = self.resolve_override(manifest, self.manifest_path());
        let manifest = ManifestStore::load(&manifest_path)?;
        let flavor = manifest.flavor_hint(&self.root_label());
        let root = match flavor {
            Flavor::Web => web_root(&self.root_label()),
            Flavor::Local | Flavor::Remote => self.root_label(),
        };
        let defects = inspect(&manifest, &root);
        info!(%flavor, defects = defects.len(), "Manifest inspected");
        Ok(InspectReport {
            ok: defects.is_empty(),
            flavor,
            root,
            counts: manifest.counts(),
            defects,
            manifest_path,
        })
    }
}
