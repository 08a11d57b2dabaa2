//! CLI route: single route table and run context. Dispatches to the catalog
//! service and presentation.

use crate::cli::help::{command_name, is_mutating};
use crate::cli::output::CommandOutput;
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_export_report, format_fix_report, format_generate_report, format_inspect_report,
    format_local_report, format_remote_report, format_resolve_report, format_rewrite_plan, format_rewrite_report,
};
use crate::config::ConfigLoader;
use crate::error::ApiError;
use crate::service::{CatalogService, RemoteVerifyRequest};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Runtime context for CLI execution: workspace, config path, and the service.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    service: CatalogService,
    workspace_root: PathBuf,
    config_path: Option<PathBuf>,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        let config = config.validated()?;

        Ok(Self {
            service: CatalogService::new(workspace_root.clone(), config),
            workspace_root,
            config_path,
        })
    }

    pub fn service(&self) -> &CatalogService {
        &self.service
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<CommandOutput, ApiError> {
        let started = Instant::now();
        info!(
            command = command_name(command),
            mutating = is_mutating(command),
            workspace = %self.workspace_root.display(),
            "Running command"
        );
        let result = self.execute_inner(command);
        match &result {
            Ok(output) => info!(
                command = command_name(command),
                ok = output.ok,
                duration_ms = started.elapsed().as_millis() as u64,
                "Command finished"
            ),
            Err(e) => debug!(command = command_name(command), error = %e, "Command failed"),
        }
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<CommandOutput, ApiError> {
        match command {
            Commands::Generate { format } => {
                let report = self.service.generate()?;
                Ok(CommandOutput::new(
                    format_generate_report(&report, format)?,
                    report.ok,
                ))
            }
            Commands::Sanitize {
                dry_run,
                yes,
                from_manifest,
                format,
            } => self.handle_sanitize(*dry_run, *yes, *from_manifest, format),
            Commands::ResolveUrls { strategy, format } => {
                let report = self.service.resolve_urls(*strategy)?;
                Ok(CommandOutput::new(
                    format_resolve_report(&report, format)?,
                    report.ok,
                ))
            }
            Commands::VerifyLocal { manifest, format } => {
                let report = self.service.verify_local(manifest.as_deref())?;
                Ok(CommandOutput::new(
                    format_local_report(&report, format)?,
                    report.ok,
                ))
            }
            Commands::VerifyRemote {
                manifest,
                concurrency,
                timeout_secs,
                format,
            } => {
                let request = RemoteVerifyRequest {
                    manifest: manifest.clone(),
                    concurrency: *concurrency,
                    timeout_secs: *timeout_secs,
                };
                let runtime = tokio::runtime::Runtime::new()
                    .map_err(|e| ApiError::Runtime(format!("Failed to start runtime: {}", e)))?;
                let report = runtime.block_on(self.service.verify_remote(&request))?;
                Ok(CommandOutput::new(
                    format_remote_report(&report, format)?,
                    report.ok,
                ))
            }
            Commands::FixPaths {
                manifest,
                dry_run,
                format,
            } => {
                let report = self.service.fix_paths(manifest.as_deref(), *dry_run)?;
                let ok = report.fix.ok;
                Ok(CommandOutput::new(format_fix_report(&report, format)?, ok))
            }
            Commands::ExportWeb { output, format } => {
                let report = self.service.export_web(output.as_deref())?;
                Ok(CommandOutput::new(
                    format_export_report(&report, format)?,
                    report.ok,
                ))
            }
            Commands::Inspect { manifest, format } => {
                let report = self.service.inspect_manifest(manifest.as_deref())?;
                Ok(CommandOutput::new(
                    format_inspect_report(&report, format)?,
                    report.ok,
                ))
            }
            Commands::Config => self.handle_config(),
        }
    }

    fn handle_sanitize(
        &self,
        dry_run: bool,
        yes: bool,
        from_manifest: bool,
        format: &str,
    ) -> Result<CommandOutput, ApiError> {
        let plan = self.service.plan_sanitize(from_manifest)?;
        if dry_run {
            let ok = plan.conflicts.is_empty();
            return Ok(CommandOutput::new(format_rewrite_plan(&plan, format)?, ok));
        }

        if plan.conflicts.is_empty() && !plan.is_noop() && !yes {
            if !std::io::stdin().is_terminal() {
                return Err(ApiError::Cancelled(
                    "non-interactive session; pass --yes to apply the renames".to_string(),
                ));
            }
            use dialoguer::Confirm;
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Rename {} entries under {}? A backup is taken first.",
                    plan.ops.len(),
                    self.service.root_path().display()
                ))
                .interact()
                .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;

            if !confirmed {
                return Ok(CommandOutput::new("Sanitize cancelled".to_string(), true));
            }
        }

        let report = self.service.sanitize(from_manifest)?;
        Ok(CommandOutput::new(
            format_rewrite_report(&report, format)?,
            report.ok,
        ))
    }

    fn handle_config(&self) -> Result<CommandOutput, ApiError> {
        let mut out = String::new();
        match &self.config_path {
            Some(path) => out.push_str(&format!("# loaded from {}\n", path.display())),
            None => {
                if let Some(global) = ConfigLoader::global_config_path() {
                    out.push_str(&format!("# global file: {}\n", global.display()));
                }
                out.push_str(&format!(
                    "# workspace: {}\n",
                    self.workspace_root.display()
                ));
            }
        }
        out.push_str(&self.service.config().to_toml()?);
        Ok(CommandOutput::new(out, true))
    }
}
