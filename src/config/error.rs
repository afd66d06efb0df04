//! Error types for configuration loading.
//!
//! Every failure carries the file and stage it happened in. Nothing is
//! recovered internally: a load is all-or-nothing.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::render::TemplateError;

/// Which pass of a load produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Building the variable store from the vars subtree.
    Variables,
    /// Rendering, parsing and merging the root tree.
    ConfigFiles,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Variables => write!(f, "variables"),
            Phase::ConfigFiles => write!(f, "config files"),
        }
    }
}

/// Distinguishable error kinds, independent of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedExtension,
    DirectoryWalkFailure,
    FileReadFailure,
    TemplateParseFailure,
    TemplateExecutionFailure,
    ParseFailure,
    MergeFailure,
    UnmarshalFailure,
}

/// Decode error from one of the structured-text formats.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Content(String),
}

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("loading {phase}: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("unsupported config file extension {extension:?}: {}", path.display())]
    UnsupportedExtension { path: PathBuf, extension: String },

    #[error("walking directory {}: {source}", dir.display())]
    DirectoryWalk {
        dir: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("reading file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parsing template {}: {source}", path.display())]
    TemplateParse {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },

    #[error("rendering {}: {source}", path.display())]
    TemplateExecution {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },

    #[error("parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("merging {}: {reason}", path.display())]
    Merge { path: PathBuf, reason: String },

    #[error("unmarshaling config: {source}")]
    Unmarshal {
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub(crate) fn in_phase(self, phase: Phase) -> Self {
        ConfigError::Phase {
            phase,
            source: Box::new(self),
        }
    }

    /// The kind of failure, looking through phase wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::Phase { source, .. } => source.kind(),
            ConfigError::UnsupportedExtension { .. } => ErrorKind::UnsupportedExtension,
            ConfigError::DirectoryWalk { .. } => ErrorKind::DirectoryWalkFailure,
            ConfigError::FileRead { .. } => ErrorKind::FileReadFailure,
            ConfigError::TemplateParse { .. } => ErrorKind::TemplateParseFailure,
            ConfigError::TemplateExecution { .. } => ErrorKind::TemplateExecutionFailure,
            ConfigError::Parse { .. } => ErrorKind::ParseFailure,
            ConfigError::Merge { .. } => ErrorKind::MergeFailure,
            ConfigError::Unmarshal { .. } => ErrorKind::UnmarshalFailure,
        }
    }

    /// The pass that failed, if the error was raised inside one.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            ConfigError::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// The offending file or directory, when the failure is tied to one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Phase { source, .. } => source.path(),
            ConfigError::UnsupportedExtension { path, .. }
            | ConfigError::FileRead { path, .. }
            | ConfigError::TemplateParse { path, .. }
            | ConfigError::TemplateExecution { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Merge { path, .. } => Some(path),
            ConfigError::DirectoryWalk { dir, .. } => Some(dir),
            ConfigError::Unmarshal { .. } => None,
        }
    }
}
