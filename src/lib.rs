//! cardea: hierarchical configuration loading for a routing gateway.
//!
//! Loads a directory of YAML/JSON/TOML files, renders each one as a template
//! against a separately loaded vars directory, deep-merges them in a fixed
//! order, and materializes the result as a typed [`Config`].

pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::{Config, ConfigError, Loader};
