//! Process handles, exit statuses and scan results

use std::fmt;

/// Handle to a detached process spawned by the host
///
/// Detached processes lead their own process group, so `pgid == pid` on Linux.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessHandle {
    pub pid: u32,
    pub pgid: u32,
}

impl ProcessHandle {
    pub fn new(pid: u32, pgid: u32) -> Self {
        Self { pid, pgid }
    }
}

/// Exit status of a process run to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    /// Exit code if the process exited normally
    pub code: Option<i32>,

    /// Signal number if signaled (Unix)
    pub signal: Option<i32>,
}

impl ExitStatus {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            signal: None,
        }
    }

    pub fn with_code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    pub fn signaled(signal: i32) -> Self {
        Self {
            code: None,
            signal: Some(signal),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::with_code(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(sig) = status.signal() {
                return Self::signaled(sig);
            }
        }

        Self::with_code(-1)
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit status {}", code),
            (None, Some(sig)) => write!(f, "signal {}", sig),
            (None, None) => write!(f, "unknown status"),
        }
    }
}

/// Result of a liveness scan over the process table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Matching pids, ascending
    pub pids: Vec<u32>,
}

impl ScanResult {
    pub fn new(mut pids: Vec<u32>) -> Self {
        pids.sort_unstable();
        pids.dedup();
        Self { pids }
    }

    pub fn running(&self) -> bool {
        !self.pids.is_empty()
    }
}

/// Case-insensitive substring match used by every liveness scan.
///
/// This is a name heuristic: unrelated processes sharing the substring match too.
pub fn name_matches(process_name: &str, query: &str) -> bool {
    process_name
        .to_lowercase()
        .contains(&query.to_lowercase())
}
