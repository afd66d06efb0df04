//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Parse CLI → Init logging → Load config → Validate → Print
//!
//! Watch mode:
//!     Start watcher → print each reload → wait for signal
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → stop watching and exit cleanly
//! ```
//!
//! # Design Decisions
//! - Fail fast: a config that can't be loaded at startup is fatal
//! - Reload failures are logged; the last good config stays current

pub mod signals;
