//! Host traits

use async_trait::async_trait;
use std::fs::File;
use std::time::Duration;
use thiserror::Error;

use crate::{CommandSpec, ExitStatus, ProcessHandle, ScanResult};

/// Errors from host operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Signal failed: {0}")]
    SignalFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HostResult<T> = Result<T, HostError>;

/// Signals the session lifecycle sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// SIGTERM: ask the process to exit
    Terminate,
    /// SIGKILL: cannot be caught or ignored
    Kill,
}

/// Outcome of a signal that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The target no longer exists (ESRCH); benign in a multi-invocation design
    AlreadyGone,
}

/// Output redirection for a detached process
#[derive(Debug, Default)]
pub struct SpawnOptions {
    /// Sink for stdout; discarded when `None`
    pub stdout: Option<File>,

    /// Sink for stderr; discarded when `None`
    pub stderr: Option<File>,
}

/// Operating-system services used by the session monitor and the
/// termination coordinator.
///
/// Every blocking point of the session lifecycle goes through this trait,
/// including the clock, so tests can substitute a virtual one.
#[async_trait]
pub trait SessionHost: Send + Sync {
    /// Snapshot the process table and return every live process whose name
    /// contains `name` (case-insensitive). Never fails: processes that vanish
    /// or cannot be inspected are skipped. The caller's own pid is never
    /// reported.
    fn scan(&self, name: &str) -> ScanResult;

    /// Spawn a process detached into its own session, with output redirected
    /// to the given sinks.
    fn spawn_detached(
        &self,
        command: &CommandSpec,
        options: SpawnOptions,
    ) -> HostResult<ProcessHandle>;

    /// Run a process to completion.
    async fn run(&self, command: &CommandSpec) -> HostResult<ExitStatus>;

    /// Send a signal to a single pid.
    fn signal(&self, pid: u32, signal: Signal) -> HostResult<Delivery>;

    /// Send a signal to the process group of a detached process.
    fn stop(&self, handle: &ProcessHandle, signal: Signal) -> HostResult<Delivery>;

    /// Whether `program` exists on disk
    fn program_exists(&self, program: &str) -> bool;

    /// Suspend the invocation for `duration`
    async fn sleep(&self, duration: Duration);

    /// Pid of the current invocation
    fn own_pid(&self) -> u32;
}
