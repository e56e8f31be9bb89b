//! Session monitor
//!
//! Owns the supervising invocation for the whole session:
//!
//! ```text
//! Init -> Launching -> Running -> TearingDown -> Terminated
//! ```
//!
//! The target application is considered alive as long as a liveness scan by
//! name finds it. Unrelated processes whose names contain the same substring
//! keep the session alive too; this is a known limitation of name matching.

use bpsession_host_api::{Delivery, SessionHost, Signal};
use bpsession_util::Result;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{
    InstanceGuard, SessionCommands, SessionLogs, SessionState, TARGET_PROCESS_NAME,
    TeardownReason, launch,
};

/// Interval between liveness scans while the session runs
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Supervises one session from launch to teardown
pub struct SessionMonitor<'a, H: SessionHost + ?Sized> {
    host: &'a H,
    guard: &'a InstanceGuard,
    commands: &'a SessionCommands,
    state: SessionState,
}

impl<'a, H: SessionHost + ?Sized> SessionMonitor<'a, H> {
    pub fn new(host: &'a H, guard: &'a InstanceGuard, commands: &'a SessionCommands) -> Self {
        Self {
            host,
            guard,
            commands,
            state: SessionState::Init,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Launch the session and block until it ends.
    ///
    /// `shutdown` resolves when the supervisor is asked to terminate (the
    /// binary wires it to SIGTERM/SIGINT/SIGHUP); the session is then torn
    /// down as if the target had exited. It is only observed while running.
    pub async fn run<F>(&mut self, logs: SessionLogs, shutdown: F) -> Result<TeardownReason>
    where
        F: Future<Output = ()>,
    {
        self.guard.acquire(self.host.own_pid())?;
        self.clear_stale_target();

        self.transition(SessionState::Launching);
        let session = match launch(self.host, self.commands, &logs).await {
            Ok(session) => session,
            Err(e) => {
                self.finish(logs);
                return Err(e);
            }
        };

        self.transition(SessionState::Running);
        tokio::pin!(shutdown);
        let reason = loop {
            let scan = self.host.scan(TARGET_PROCESS_NAME);
            if !scan.running() {
                info!("Target application no longer running");
                break TeardownReason::TargetExited;
            }
            debug!(pids = ?scan.pids, "Target application alive");

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Termination requested");
                    break TeardownReason::Signaled;
                }
                _ = self.host.sleep(POLL_INTERVAL) => {}
            }
        };

        self.transition(SessionState::TearingDown);
        match self.host.stop(&session.window_manager, Signal::Terminate) {
            Ok(Delivery::Delivered) => {
                info!(pid = session.window_manager.pid, "Window manager signaled")
            }
            Ok(Delivery::AlreadyGone) => {
                debug!(pid = session.window_manager.pid, "Window manager already gone")
            }
            Err(e) => warn!(error = %e, "Failed to stop window manager"),
        }

        self.finish(logs);
        Ok(reason)
    }

    /// Kill target instances left over from a previous session
    fn clear_stale_target(&self) {
        let stale = self.host.scan(TARGET_PROCESS_NAME);
        if !stale.running() {
            return;
        }

        warn!(pids = ?stale.pids, "Target application already running, killing it");
        for pid in stale.pids {
            if let Err(e) = self.host.signal(pid, Signal::Kill) {
                warn!(pid = pid, error = %e, "Failed to kill stale target process");
            }
        }
    }

    fn finish(&mut self, logs: SessionLogs) {
        logs.close();
        if let Err(e) = self.guard.release() {
            warn!(error = %e, "Failed to release instance guard");
        }
        self.transition(SessionState::Terminated);
    }

    fn transition(&mut self, next: SessionState) {
        info!(from = %self.state, to = %next, "Session state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TARGET_SETTLE, build_commands};
    use bpsession_config::LaunchConfig;
    use bpsession_host_api::{HostCall, MOCK_OWN_PID, MockHost};
    use bpsession_util::LogPaths;
    use std::future::pending;

    struct Fixture {
        _dir: tempfile::TempDir,
        guard: InstanceGuard,
        log_paths: LogPaths,
        commands: SessionCommands,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        Fixture {
            guard: InstanceGuard::new(dir.path().join("bpsession.pid")),
            log_paths: LogPaths::in_dir(dir.path().join("logs")),
            commands: build_commands(&LaunchConfig::default()),
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn tears_down_when_target_exits() {
        let fx = fixture();
        let host = MockHost::new();
        host.set_lifetime("steam", Duration::from_secs(10));

        let logs = SessionLogs::open(&fx.log_paths).unwrap();
        let mut monitor = SessionMonitor::new(&host, &fx.guard, &fx.commands);
        let reason = monitor.run(logs, pending()).await.unwrap();

        assert_eq!(reason, TeardownReason::TargetExited);
        assert_eq!(monitor.state(), SessionState::Terminated);
        assert!(!fx.guard.path().exists());

        // 3 s settle after spawn, then 1 s polls until the 10 s lifetime ends
        let polls = host
            .calls()
            .iter()
            .filter(|c| **c == HostCall::Sleep(POLL_INTERVAL))
            .count();
        assert_eq!(polls, 7);

        let wm_pid = host.processes()[0].pid;
        assert_eq!(
            host.calls().last(),
            Some(&HostCall::Stop {
                pid: wm_pid,
                signal: Signal::Terminate
            })
        );
        assert!(!host.is_alive(wm_pid));
    }

    #[tokio::test]
    async fn pid_file_holds_own_pid_while_running() {
        let fx = fixture();
        let host = MockHost::new();
        host.set_lifetime("steam", TARGET_SETTLE + Duration::from_secs(1));

        let logs = SessionLogs::open(&fx.log_paths).unwrap();
        let guard = fx.guard.clone();
        let probe = {
            let guard = guard.clone();
            async move {
                // Runs on the first poll, after launch completed
                assert_eq!(guard.read_supervisor_pid().unwrap(), MOCK_OWN_PID);
                std::future::pending::<()>().await
            }
        };

        let mut monitor = SessionMonitor::new(&host, &guard, &fx.commands);
        monitor.run(logs, probe).await.unwrap();
        assert!(guard.read_supervisor_pid().unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn stale_target_is_killed_before_launch() {
        let fx = fixture();
        let host = MockHost::new();
        let stale = host.add_process("steam");
        host.set_lifetime("steam", Duration::from_secs(4));

        let logs = SessionLogs::open(&fx.log_paths).unwrap();
        let mut monitor = SessionMonitor::new(&host, &fx.guard, &fx.commands);
        monitor.run(logs, pending()).await.unwrap();

        assert_eq!(
            host.calls()[0],
            HostCall::Signal {
                pid: stale,
                signal: Signal::Kill
            }
        );
        assert!(matches!(host.calls()[1], HostCall::Spawn(_)));
    }

    #[tokio::test]
    async fn shutdown_signal_tears_down() {
        let fx = fixture();
        let host = MockHost::new();
        // Target never exits on its own

        let logs = SessionLogs::open(&fx.log_paths).unwrap();
        let mut monitor = SessionMonitor::new(&host, &fx.guard, &fx.commands);
        let reason = monitor.run(logs, std::future::ready(())).await.unwrap();

        assert_eq!(reason, TeardownReason::Signaled);
        assert!(!fx.guard.path().exists());
        assert!(matches!(
            host.calls().last(),
            Some(HostCall::Stop {
                signal: Signal::Terminate,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn launch_failure_releases_guard() {
        let fx = fixture();
        let host = MockHost::new();
        host.set_exit_code(&["xset", "-dpms"], 1);

        let logs = SessionLogs::open(&fx.log_paths).unwrap();
        let mut monitor = SessionMonitor::new(&host, &fx.guard, &fx.commands);
        let result = monitor.run(logs, pending()).await;

        assert!(result.is_err());
        assert_eq!(monitor.state(), SessionState::Terminated);
        assert!(!fx.guard.path().exists());
    }

    #[tokio::test]
    async fn guard_failure_prevents_launch() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let guard = InstanceGuard::new(blocker.join("bpsession.pid"));
        let commands = build_commands(&LaunchConfig::default());
        let host = MockHost::new();

        let logs = SessionLogs::open(&LogPaths::in_dir(dir.path().join("logs"))).unwrap();
        let mut monitor = SessionMonitor::new(&host, &guard, &commands);
        let result = monitor.run(logs, pending()).await;

        assert!(result.is_err());
        assert!(host.calls().is_empty());
    }
}
