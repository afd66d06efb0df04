//! Config file discovery.
//!
//! # Responsibilities
//! - Walk a directory tree and pick files with a recognized extension
//! - Skip an excluded subtree (the vars directory) entirely
//! - Return files in merge order: depth ascending, then path ascending
//!
//! # Design Decisions
//! - A missing root is not an error; it yields no files
//! - Ordering is part of the contract: later files override earlier ones

use std::cmp::Ordering;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::error::ConfigError;

/// Extensions the collector accepts. Must stay in sync with [`crate::config::format::Format`].
pub const SUPPORTED_EXTENSIONS: &[&str] = &["yaml", "yml", "json", "toml"];

/// Returns true if the path has one of the supported extensions (case-insensitive).
pub fn is_config_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// Collect config files under `dir`, skipping the `skip` subtree if given.
pub fn collect_config_files(dir: &Path, skip: Option<&Path>) -> Result<Vec<PathBuf>, ConfigError> {
    let walker = WalkDir::new(dir).into_iter().filter_entry(|entry| {
        let excluded = entry.file_type().is_dir() && skip.is_some_and(|s| entry.path() == s);
        if excluded {
            tracing::trace!(dir = %entry.path().display(), "Skipping excluded subtree");
        }
        !excluded
    });

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 && is_not_found(&e) => {
                tracing::debug!(dir = %dir.display(), "Directory not found, nothing to collect");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(ConfigError::DirectoryWalk {
                    dir: dir.to_path_buf(),
                    source,
                });
            }
        };

        if entry.file_type().is_dir() || !is_config_file(entry.path()) {
            continue;
        }
        files.push((entry.depth(), entry.into_path()));
    }

    files.sort_by(|(depth_a, a), (depth_b, b)| compare_for_merge(*depth_a, a, *depth_b, b));

    Ok(files.into_iter().map(|(_, path)| path).collect())
}

fn is_not_found(err: &walkdir::Error) -> bool {
    err.io_error().is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
}

/// Depth first, then the full path compared as a string.
fn compare_for_merge(depth_a: usize, a: &Path, depth_b: usize, b: &Path) -> Ordering {
    depth_a
        .cmp(&depth_b)
        .then_with(|| a.to_string_lossy().cmp(&b.to_string_lossy()))
}
