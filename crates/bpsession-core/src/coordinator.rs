//! Termination coordinator
//!
//! Runs in a separate invocation against an already-running session and
//! escalates until the target application is gone:
//!
//! ```text
//! Idle -> GracefulRequested -> ForceKillByName -> KillSupervisor -> Terminated
//! ```
//!
//! Each stage re-scans the process table after a short settle and stops
//! escalating as soon as the target has disappeared. Two coordinators running
//! at once are not serialized; whichever touches the pid file last wins.

use bpsession_host_api::{Delivery, SessionHost, Signal};
use bpsession_util::{Result, SessionError};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::launcher::run_required;
use crate::{CoordinatorState, Escalation, InstanceGuard, SessionCommands, TARGET_PROCESS_NAME};

/// Wait between an escalation step and the re-scan that judges it
pub const ESCALATION_SETTLE: Duration = Duration::from_millis(100);

/// Parse the optional graceful delay argument (seconds, fractional allowed).
///
/// Must be a finite, non-negative number.
pub fn parse_grace_delay(raw: &str) -> Result<Duration> {
    let secs: f64 = raw.trim().parse().map_err(|_| {
        SessionError::validation(format!("delay must be a number of seconds, got {:?}", raw))
    })?;

    if !secs.is_finite() || secs < 0.0 {
        return Err(SessionError::validation(format!(
            "delay must be a non-negative number of seconds, got {:?}",
            raw
        )));
    }

    Duration::try_from_secs_f64(secs)
        .map_err(|e| SessionError::validation(format!("delay {:?} out of range: {}", raw, e)))
}

/// Escalating shutdown of a running session
pub struct TerminationCoordinator<'a, H: SessionHost + ?Sized> {
    host: &'a H,
    guard: &'a InstanceGuard,
    commands: &'a SessionCommands,
    state: CoordinatorState,
}

impl<'a, H: SessionHost + ?Sized> TerminationCoordinator<'a, H> {
    pub fn new(host: &'a H, guard: &'a InstanceGuard, commands: &'a SessionCommands) -> Self {
        Self {
            host,
            guard,
            commands,
            state: CoordinatorState::Idle,
        }
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    /// Run the cascade, returning the deepest stage that was needed.
    ///
    /// A failing shutdown command aborts the cascade with a launch error.
    pub async fn run(&mut self, grace_delay: Option<Duration>) -> Result<Escalation> {
        self.transition(CoordinatorState::GracefulRequested);
        if let Some(delay) = grace_delay {
            info!(delay_secs = delay.as_secs_f64(), "Waiting before shutdown");
            self.host.sleep(delay).await;
        }
        run_required(self.host, &self.commands.target_shutdown).await?;

        if self.target_gone().await {
            return Ok(self.finish(Escalation::Graceful));
        }

        self.transition(CoordinatorState::ForceKillByName);
        self.kill_target_by_name();

        if self.target_gone().await {
            return Ok(self.finish(Escalation::ForceKillByName));
        }

        self.transition(CoordinatorState::KillSupervisor);
        self.kill_supervisor();

        Ok(self.finish(Escalation::KillSupervisor))
    }

    async fn target_gone(&self) -> bool {
        self.host.sleep(ESCALATION_SETTLE).await;
        let scan = self.host.scan(TARGET_PROCESS_NAME);
        if scan.running() {
            debug!(pids = ?scan.pids, "Target application still running");
        }
        !scan.running()
    }

    fn kill_target_by_name(&self) {
        for pid in self.host.scan(TARGET_PROCESS_NAME).pids {
            match self.host.signal(pid, Signal::Kill) {
                Ok(Delivery::Delivered) => info!(pid = pid, "Killed target process"),
                Ok(Delivery::AlreadyGone) => debug!(pid = pid, "Target process already gone"),
                Err(e) => warn!(pid = pid, error = %e, "Failed to kill target process"),
            }
        }
    }

    /// Signal the supervising invocation and drop the pid file, whatever happens
    fn kill_supervisor(&self) {
        match self.guard.read_supervisor_pid() {
            Ok(pid) if pid == self.host.own_pid() => {
                warn!(pid = pid, "Pid file names this invocation, not signaling");
            }
            Ok(pid) => match self.host.signal(pid, Signal::Terminate) {
                Ok(Delivery::Delivered) => info!(pid = pid, "Supervisor signaled"),
                Ok(Delivery::AlreadyGone) => info!(pid = pid, "Supervisor already gone"),
                Err(e) => warn!(pid = pid, error = %e, "Failed to signal supervisor"),
            },
            Err(e) if e.is_not_found() => info!("No pid file, session already terminated"),
            Err(e) => warn!(error = %e, "Cannot read supervisor pid"),
        }

        if let Err(e) = self.guard.release() {
            warn!(error = %e, "Failed to remove pid file");
        }
    }

    fn finish(&mut self, escalation: Escalation) -> Escalation {
        self.transition(CoordinatorState::Terminated);
        info!(?escalation, "Session terminated");
        escalation
    }

    fn transition(&mut self, next: CoordinatorState) {
        info!(from = %self.state, to = %next, "Termination state");
        self.state = next;
    }
}
