//! Configuration loading from a directory tree.
//!
//! # Lifecycle
//! ```text
//! Created
//!   → VariablesLoading → VariablesLoaded
//!   → ConfigLoading (per file: Read → Render → Parse → Merge)
//!   → Materializing → Done
//! ```
//! Any stage can fail; the failure is terminal for that loader. `load`
//! consumes the loader, so a retry needs a fresh one.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::collector::collect_config_files;
use crate::config::error::{ConfigError, Phase};
use crate::config::format::Format;
use crate::config::render::{render_file, RenderContext};
use crate::config::schema::Config;
use crate::config::tree::ConfigTree;
use crate::config::vars::VariableStore;

/// Name of the variables subdirectory when none is given.
pub const DEFAULT_VARS_DIR: &str = "_vars";

/// Step within a single file's load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStage {
    Read,
    Render,
    Parse,
    Merge,
}

/// Where a load currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Created,
    VariablesLoading,
    VariablesLoaded,
    ConfigLoading { file: PathBuf, stage: FileStage },
    Materializing,
    Done,
    Failed(Box<LoadState>),
}

/// Loads, renders and merges a config directory into a [`Config`].
#[derive(Debug, Clone)]
pub struct Loader {
    root: PathBuf,
    vars_dir: PathBuf,
    state: LoadState,
}

impl Loader {
    /// Create a loader for the config tree at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let vars_dir = root.join(DEFAULT_VARS_DIR);
        Self {
            root,
            vars_dir,
            state: LoadState::Created,
        }
    }

    /// Use `name` (relative to the root) as the variables subdirectory.
    pub fn with_vars_dir(mut self, name: impl AsRef<Path>) -> Self {
        self.vars_dir = self.root.join(name);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn vars_dir(&self) -> &Path {
        &self.vars_dir
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Run the full pipeline. Reads the filesystem from scratch.
    pub fn load(mut self) -> Result<Config, ConfigError> {
        match self.run() {
            Ok(config) => {
                self.transition(LoadState::Done);
                Ok(config)
            }
            Err(err) => {
                let failed_at = std::mem::replace(&mut self.state, LoadState::Created);
                self.transition(LoadState::Failed(Box::new(failed_at)));
                Err(err)
            }
        }
    }

    fn run(&mut self) -> Result<Config, ConfigError> {
        self.transition(LoadState::VariablesLoading);
        let vars = VariableStore::load(&self.vars_dir).map_err(|e| e.in_phase(Phase::Variables))?;
        self.transition(LoadState::VariablesLoaded);

        let files = collect_config_files(&self.root, Some(&self.vars_dir))
            .map_err(|e| e.in_phase(Phase::ConfigFiles))?;

        let context = RenderContext::new(vars.context());
        let mut tree = ConfigTree::new();
        for file in &files {
            load_file_observed(file, &mut tree, Some(&context), |stage| {
                self.transition(LoadState::ConfigLoading {
                    file: file.clone(),
                    stage,
                })
            })
            .map_err(|e| e.in_phase(Phase::ConfigFiles))?;
        }

        self.transition(LoadState::Materializing);
        let config = Config::from_tree(tree)?;

        tracing::info!(
            root = %self.root.display(),
            variable_files = vars.file_count(),
            config_files = files.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    fn transition(&mut self, next: LoadState) {
        tracing::trace!(from = ?self.state, to = ?next, "Loader state change");
        self.state = next;
    }
}

/// Read → (render) → parse → merge one file into `tree`.
///
/// Rendering only happens when a context is given.
pub(crate) fn load_file(path: &Path, tree: &mut ConfigTree, context: Option<&RenderContext>) -> Result<(), ConfigError> {
    load_file_observed(path, tree, context, |_| {})
}

fn load_file_observed(
    path: &Path,
    tree: &mut ConfigTree,
    context: Option<&RenderContext>,
    mut on_stage: impl FnMut(FileStage),
) -> Result<(), ConfigError> {
    on_stage(FileStage::Read);
    let content = fs::read(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let content = match context {
        Some(context) => {
            on_stage(FileStage::Render);
            render_file(path, &content, context)?
        }
        None => content,
    };

    on_stage(FileStage::Parse);
    let format = Format::from_path(path)?;
    let document = format.parse(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    on_stage(FileStage::Merge);
    tree.merge(document).map_err(|reason| ConfigError::Merge {
        path: path.to_path_buf(),
        reason,
    })?;

    tracing::debug!(path = %path.display(), %format, rendered = context.is_some(), "Merged config file");
    Ok(())
}
