//! Lifecycle states

use std::fmt;

/// Session monitor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Launching,
    Running,
    TearingDown,
    Terminated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Init => "init",
            Self::Launching => "launching",
            Self::Running => "running",
            Self::TearingDown => "tearing-down",
            Self::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// Why a running session was torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownReason {
    /// The liveness scan no longer finds the target application
    TargetExited,
    /// The supervisor received a termination signal
    Signaled,
}

/// Termination coordinator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    GracefulRequested,
    ForceKillByName,
    KillSupervisor,
    Terminated,
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::GracefulRequested => "graceful-requested",
            Self::ForceKillByName => "force-kill-by-name",
            Self::KillSupervisor => "kill-supervisor",
            Self::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// Deepest escalation stage a termination needed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Escalation {
    /// The shutdown command was enough
    Graceful,
    /// The target was killed by name
    ForceKillByName,
    /// The supervising process itself was killed
    KillSupervisor,
}
