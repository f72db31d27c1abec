// src/fs/mock.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};

use super::FileSystem;

/// In-memory filesystem holding only files; directories exist implicitly as
/// ancestors of stored files.
///
/// Paths are stored exactly as given, so tests should use one consistent
/// style (e.g. always `specs/auth/login.spec.toml`).
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<BTreeMap<PathBuf, Vec<u8>>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut files = self.files.lock().expect("mock fs lock poisoned");
        files.insert(path.as_ref().to_path_buf(), content.into());
    }

    /// Paths of every stored file, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        let files = self.files.lock().expect("mock fs lock poisoned");
        files.keys().cloned().collect()
    }
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let files = self.files.lock().expect("mock fs lock poisoned");
        files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("File not found: {:?}", path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn is_file(&self, path: &Path) -> bool {
        let files = self.files.lock().expect("mock fs lock poisoned");
        files.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let files = self.files.lock().expect("mock fs lock poisoned");
        files
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }

    /// No links in memory: every path is its own canonical form.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        Ok(path.to_path_buf())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let files = self.files.lock().expect("mock fs lock poisoned");
        let mut children = BTreeSet::new();

        for file in files.keys() {
            if file == path {
                continue;
            }
            if let Ok(rel) = file.strip_prefix(path) {
                if let Some(first) = rel.components().next() {
                    children.insert(path.join(first.as_os_str()));
                }
            }
        }

        if children.is_empty() {
            return Err(anyhow!("Not a directory or not found: {:?}", path));
        }
        Ok(children.into_iter().collect())
    }
}
