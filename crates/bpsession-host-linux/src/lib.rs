//! Linux host for bpsession
//!
//! Provides:
//! - Process table scanning by name
//! - Detached spawning into a new session with output redirected to log files
//! - SIGTERM/SIGKILL delivery to single pids and process groups
//! - Synchronous command runs and settle delays on the tokio runtime

mod adapter;
mod process;
mod scan;

pub use adapter::*;
pub use process::*;
pub use scan::*;
