// src/spec/mod.rs

//! Spec source: discovery and loading of declarative test specs.
//!
//! - [`discover`] walks the specs directory and returns sorted [`SpecRef`]s.
//! - [`loader`] parses and validates spec TOML into [`Task`]s.
//! - [`model`] holds the raw and validated spec types.
//! - [`deps`] reports on `metadata.dependencies` without enforcing them.

pub mod deps;
pub mod discover;
pub mod loader;
pub mod model;

pub use deps::{DependencyWarning, lint_dependencies};
pub use discover::{DEFAULT_SPEC_PATTERN, SpecRef, discover, filter_refs};
pub use loader::{load, load_all, parse_spec};
pub use model::{RawTestSpec, SpecMetadata, Task, TestSpec};
