// src/config/mod.rs

//! Configuration loading and validation for specpilot.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load `Specpilot.toml` and layer overrides on top (`loader.rs`, `overrides.rs`).
//! - Validate the merged result (`validate.rs`).

pub mod loader;
pub mod model;
pub mod overrides;
pub mod validate;

pub use loader::{ConfigSource, default_config_path, load_and_validate, load_from_path};
pub use model::{AgentSection, ConfigFile, RawConfigFile, ReportSection, RunSection};
pub use overrides::ConfigOverrides;
pub use validate::check_required_env;
