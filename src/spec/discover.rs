// src/spec/discover.rs

//! Enumerate spec files below a directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{Glob, GlobMatcher};
use regex::Regex;
use tracing::{debug, warn};

use crate::engine::TaskId;
use crate::errors::{Result, SpecpilotError};
use crate::fs::FileSystem;

/// Default glob (relative to the specs directory) selecting spec files.
pub const DEFAULT_SPEC_PATTERN: &str = "**/*.spec.toml";

/// A discovered, not yet loaded, spec file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRef {
    pub id: TaskId,
    pub path: PathBuf,
}

/// Walk `root` and return every file whose relative path matches `pattern`,
/// sorted lexicographically by relative path.
///
/// Each directory is walked once, keyed by its canonical path, so symlinks
/// looping back into the tree do not yield the same spec twice.
///
/// An empty result is *not* an error here; deciding that "no specs" is fatal
/// belongs to the caller.
pub fn discover(fs: &dyn FileSystem, root: &Path, pattern: &str) -> Result<Vec<SpecRef>> {
    if !fs.is_dir(root) {
        return Err(SpecpilotError::DiscoveryError(format!(
            "specs directory {:?} does not exist",
            root
        )));
    }

    let matcher = compile_pattern(pattern)?;

    let mut found: Vec<(String, PathBuf)> = Vec::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let canonical = fs
            .canonicalize(&dir)
            .with_context(|| format!("resolving spec directory {:?}", dir))?;
        if !visited.insert(canonical.clone()) {
            warn!(dir = ?dir, target = ?canonical, "skipping directory already walked");
            continue;
        }

        let entries = fs
            .read_dir(&dir)
            .with_context(|| format!("listing spec directory {:?}", dir))?;
        for path in entries {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                if let Ok(rel) = path.strip_prefix(root) {
                    let rel_str = rel.to_string_lossy().replace('\\', "/");
                    if matcher.is_match(&rel_str) {
                        found.push((rel_str, path));
                    }
                }
            }
        }
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    debug!(count = found.len(), root = ?root, pattern, "spec discovery finished");

    Ok(found
        .into_iter()
        .map(|(rel, path)| SpecRef {
            id: identifier_for(&rel),
            path,
        })
        .collect())
}

/// Keep only the refs whose identifier matches `filter`, preserving order.
pub fn filter_refs(refs: Vec<SpecRef>, filter: &Regex) -> Vec<SpecRef> {
    refs.into_iter()
        .filter(|r| filter.is_match(&r.id))
        .collect()
}

/// Identifier for a spec at relative path `rel`: the path with its spec
/// suffix removed, e.g. `auth/login.spec.toml` → `auth/login`.
pub fn identifier_for(rel: &str) -> TaskId {
    let rel = rel.replace('\\', "/");
    for suffix in [".spec.toml", ".toml"] {
        if let Some(stem) = rel.strip_suffix(suffix) {
            return stem.to_string();
        }
    }
    rel
}

fn compile_pattern(pattern: &str) -> Result<GlobMatcher> {
    let glob = Glob::new(pattern).map_err(|e| {
        SpecpilotError::ConfigError(format!("invalid spec pattern '{pattern}': {e}"))
    })?;
    Ok(glob.compile_matcher())
}
