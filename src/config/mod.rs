//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! <root>/<vars>/**  (yaml | yml | json | toml)
//!     → collector.rs (walk, filter, order by depth then path)
//!     → format.rs (parse, no rendering)
//!     → vars.rs (VariableStore, read-only)
//!
//! <root>/** minus <vars>
//!     → collector.rs
//!     → per file: read → render.rs (gtmpl, vars context built once per load)
//!                      → format.rs (parse)
//!                      → tree.rs (deep merge, last write wins)
//!     → schema.rs (materialize typed Config)
//! ```
//!
//! On change (watch mode):
//!     watcher.rs detects a config file or directory change
//!     → fresh Loader runs the full pipeline again
//!     → new Config sent to the caller
//!
//! # Design Decisions
//! - Loading is synchronous and single-threaded; merge order is the only
//!   conflict rule
//! - All-or-nothing: any error aborts the load
//! - A missing root or vars directory is empty, not an error
//! - Validation is separate from loading and never rejects a config

pub mod collector;
pub mod duration;
pub mod error;
pub mod format;
pub mod loader;
pub mod render;
pub mod schema;
pub mod tree;
pub mod validation;
pub mod vars;
pub mod watcher;

pub use error::{ConfigError, ErrorKind, ParseError, Phase};
pub use format::Format;
pub use loader::{FileStage, LoadState, Loader, DEFAULT_VARS_DIR};
pub use schema::{Backend, Config, MatchRule, Route, Timeouts};
pub use tree::ConfigTree;
pub use validation::{validate_config, ValidationError};
pub use vars::VariableStore;
pub use watcher::ConfigWatcher;
