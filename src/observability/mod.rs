//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! loader, watcher, CLI
//!     → tracing macros (structured fields: path, format, stage)
//!     → logging.rs subscriber (EnvFilter + fmt, stderr)
//! ```

pub mod logging;
