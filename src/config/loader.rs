// src/config/loader.rs

use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::config::overrides::ConfigOverrides;
use crate::errors::{Result, SpecpilotError};
use crate::fs::FileSystem;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs.read_to_string(path).map_err(|e| {
        SpecpilotError::ConfigError(format!("cannot read config {}: {e}", path.display()))
    })?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Where the configuration should come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config` was given: the file must exist.
    Explicit(PathBuf),
    /// Fall back to [`default_config_path`]; a missing file means defaults.
    Default,
}

/// Resolve, load, override and validate the configuration.
///
/// Layering, lowest to highest priority:
/// - built-in defaults (serde `Default` impls)
/// - the TOML file
/// - `overrides` (environment, then command line, already merged by the caller)
///
/// Validation runs once on the merged result, so an invalid file value that
/// is overridden on the command line is never reported.
pub fn load_and_validate(
    fs: &dyn FileSystem,
    source: &ConfigSource,
    overrides: &ConfigOverrides,
) -> Result<ConfigFile> {
    let mut raw = match source {
        ConfigSource::Explicit(path) => {
            if !fs.is_file(path) {
                return Err(SpecpilotError::ConfigError(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            load_from_path(fs, path)?
        }
        ConfigSource::Default => {
            let path = default_config_path();
            if fs.is_file(&path) {
                load_from_path(fs, &path)?
            } else {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                RawConfigFile::default()
            }
        }
    };

    overrides.apply(&mut raw);
    let config = ConfigFile::try_from(raw)?;
    Ok(config)
}

/// `Specpilot.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Specpilot.toml")
}
