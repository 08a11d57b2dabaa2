//! Single entry point for loading layered configuration

use super::merge::merge_policy;
use super::sources::{global_file, workspace_file};
use super::ResmanConfig;
use crate::error::ApiError;
use config::{Environment, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`ResmanConfig`] from defaults, files, and the environment.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): built-in defaults, global file,
    /// `<workspace>/resman.toml`, `<workspace>/resman.<RESMAN_ENV>.toml`,
    /// `RESMAN__SECTION__KEY` environment variables.
    pub fn load(workspace_root: &Path) -> Result<ResmanConfig, ApiError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let config: ResmanConfig = builder.add_source(environment()).build()?.try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load from one explicit file (plus defaults and environment).
    pub fn load_from_file(path: &Path) -> Result<ResmanConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let config: ResmanConfig = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Location of the global config file, if a home directory is known.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("RESMAN")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
