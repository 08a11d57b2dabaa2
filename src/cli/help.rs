//! CLI command-name contract for logging and routing.

use crate::cli::parse::Commands;

/// Command name as typed on the command line (e.g. "verify-remote").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Generate { .. } => "generate",
        Commands::Sanitize { .. } => "sanitize",
        Commands::ResolveUrls { .. } => "resolve-urls",
        Commands::VerifyLocal { .. } => "verify-local",
        Commands::VerifyRemote { .. } => "verify-remote",
        Commands::FixPaths { .. } => "fix-paths",
        Commands::ExportWeb { .. } => "export-web",
        Commands::Inspect { .. } => "inspect",
        Commands::Config => "config",
    }
}

/// True for commands that may rename or rewrite files.
pub fn is_mutating(command: &Commands) -> bool {
    match command {
        Commands::Sanitize { dry_run, .. } | Commands::FixPaths { dry_run, .. } => !dry_run,
        Commands::Generate { .. } | Commands::ResolveUrls { .. } | Commands::ExportWeb { .. } => {
            true
        }
        Commands::VerifyLocal { .. }
        | Commands::VerifyRemote { .. }
        | Commands::Inspect { .. }
        | Commands::Config => false,
    }
}
