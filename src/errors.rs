// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::exec::ExecutionError;

#[derive(Error, Debug)]
pub enum SpecpilotError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Discovery error: {0}")]
    DiscoveryError(String),

    #[error("Failed to load spec '{id}': {message}")]
    TaskLoadError { id: String, message: String },

    #[error("Execution error: {0}")]
    ExecutionError(#[from] ExecutionError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SpecpilotError {
    /// Shorthand for a load failure attributed to one spec.
    pub fn task_load(id: impl Into<String>, message: impl Into<String>) -> Self {
        SpecpilotError::TaskLoadError {
            id: id.into(),
            message: message.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SpecpilotError>;
