//! Config loading facade: assembles sources in precedence order.

use super::merge::merge_policy;
use super::sources::{environment, global_file};
use super::TabulaConfig;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Selects the per-environment workspace file, `config/{TABULA_ENV}.toml`.
pub const ENV_PROFILE_VAR: &str = "TABULA_ENV";
const DEFAULT_PROFILE: &str = "development";

/// Loads [`TabulaConfig`] from layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (highest last): defaults, global file, workspace files, environment.
    pub fn load(workspace_root: &Path) -> Result<TabulaConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = add_workspace_files(builder, workspace_root);
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Load configuration from an explicit file; environment still overrides it.
    pub fn load_from_file(path: &Path) -> Result<TabulaConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Path of the global config file, if a home directory is known.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    /// Workspace files that exist, base file first then the active profile.
    pub fn workspace_config_paths(workspace_root: &Path) -> Vec<PathBuf> {
        let profile = std::env::var(ENV_PROFILE_VAR)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string());
        let dir = workspace_root.join("config");

        [dir.join("config.toml"), dir.join(format!("{}.toml", profile))]
            .into_iter()
            .filter(|path| path.is_file())
            .collect()
    }
}

fn add_workspace_files(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> ConfigBuilder<DefaultState> {
    ConfigLoader::workspace_config_paths(workspace_root)
        .into_iter()
        .fold(builder, |builder, path| {
            debug!(config_path = %path.display(), "Adding workspace configuration");
            builder.add_source(File::from(path).required(false))
        })
}
