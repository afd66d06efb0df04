//! Shared utilities for integration testing.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A scratch config root that is removed when dropped.
pub fn config_root() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Write `content` to `root/rel`, creating parent directories as needed.
pub fn write_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}
