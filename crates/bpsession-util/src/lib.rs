//! Shared utilities for bpsession
//!
//! This crate provides:
//! - Error types shared by the session monitor and termination coordinator
//! - Default paths for the pid file, log files and settings document

mod error;
mod paths;

pub use error::*;
pub use paths::*;
