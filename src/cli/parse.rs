//! CLI parse: clap types for resman. No behavior; definitions only.

use crate::remote::UrlStrategy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// resman - Course resource manifest tooling
#[derive(Parser, Debug)]
#[command(name = "resman")]
#[command(version)]
#[command(about = "Scan, sanitize, publish, and verify a tree of course PDFs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (relative config paths resolve against it)
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output includes a file)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan the resource tree and save the canonical manifest
    Generate {
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Rename folders and PDFs to sanitized names (backup first)
    Sanitize {
        /// Show the rename plan without touching anything
        #[arg(long)]
        dry_run: bool,
        /// Apply without asking for confirmation
        #[arg(long, short)]
        yes: bool,
        /// Plan from the stored manifest instead of a fresh scan
        #[arg(long)]
        from_manifest: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Write the remote-URL manifest using a hosting strategy
    ResolveUrls {
        /// raw, download, or media (default: configured strategy)
        strategy: Option<UrlStrategy>,
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Check that every folder and document of a manifest exists on disk
    VerifyLocal {
        /// Manifest to check (default: canonical manifest)
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Probe every URL of the remote manifest
    VerifyRemote {
        /// Manifest to check (default: remote manifest)
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Probes in flight at once
        #[arg(long)]
        concurrency: Option<usize>,
        /// Per-probe timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Repair duplicated folder prefixes and re-run the local check
    FixPaths {
        /// Manifest to repair (default: canonical manifest)
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Report fixes without saving
        #[arg(long)]
        dry_run: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Write the web-relative manifest flavor
    ExportWeb {
        /// Output path (default: configured web manifest)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Report the flavor and structural defects of a stored manifest
    Inspect {
        /// Manifest to inspect (default: canonical manifest)
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Print the effective configuration as TOML
    Config,
}
