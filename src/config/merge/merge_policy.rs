//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources (global file, workspace files, environment) override these
/// key by key, so a file only needs the keys it changes.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("resources.root", "assets/resources")?
        .set_default("resources.manifest", "assets/resources_manifest.json")?
        .set_default("resources.web_manifest", "assets/resources_manifest_web.json")?
        .set_default("resources.remote_manifest", "assets/resources_manifest_online.json")?
        .set_default("resources.backup_suffix", "backup")?
        .set_default("resources.ignore", vec![".git"])?
        .set_default("remote.account", "")?
        .set_default("remote.repository", "")?
        .set_default("remote.branch", "main")?
        .set_default("remote.strategy", "media")?
        .set_default("remote.raw_host", "raw.githubusercontent.com")?
        .set_default("remote.host", "github.com")?
        .set_default("remote.media_host", "media.githubusercontent.com")?
        .set_default("verify.concurrency", 8)?
        .set_default("verify.timeout_secs", 10)?
        .set_default("verify.retries", 1)?
        .set_default("verify.deadline_secs", 300)?
        .set_default("verify.pointer_probe_bytes", 256)
}
