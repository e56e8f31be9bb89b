//! Process management utilities

use nix::sys::signal::{self, Signal as NixSignal};
use nix::unistd::Pid;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use tracing::debug;

use bpsession_host_api::{
    CommandSpec, Delivery, ExitStatus, HostError, HostResult, Signal, SpawnOptions,
};

fn to_nix(signal: Signal) -> NixSignal {
    match signal {
        Signal::Terminate => NixSignal::SIGTERM,
        Signal::Kill => NixSignal::SIGKILL,
    }
}

/// Send a signal to a single process. ESRCH is reported as [`Delivery::AlreadyGone`].
pub fn send_signal(pid: u32, signal: Signal) -> HostResult<Delivery> {
    let raw = positive_pid(pid)?;
    kill(Pid::from_raw(raw), signal, pid)
}

/// Send a signal to every process in a process group.
pub fn send_group_signal(pgid: u32, signal: Signal) -> HostResult<Delivery> {
    let raw = positive_pid(pgid)?;
    // Negative for process group
    kill(Pid::from_raw(-raw), signal, pgid)
}

fn positive_pid(pid: u32) -> HostResult<i32> {
    // 0 and negative values address groups or every process; never allowed here
    match i32::try_from(pid) {
        Ok(raw) if raw > 0 => Ok(raw),
        _ => Err(HostError::SignalFailed(format!("Refusing to signal pid {}", pid))),
    }
}

fn kill(target: Pid, signal: Signal, id: u32) -> HostResult<Delivery> {
    match signal::kill(target, to_nix(signal)) {
        Ok(()) => {
            debug!(pid = %target, ?signal, "Signal sent");
            Ok(Delivery::Delivered)
        }
        Err(nix::errno::Errno::ESRCH) => Ok(Delivery::AlreadyGone),
        Err(e) => Err(HostError::SignalFailed(format!(
            "Failed to send {:?} to {}: {}",
            signal, id, e
        ))),
    }
}

/// Detached child process leading its own process group
pub struct ManagedProcess {
    pub child: Child,
    pub pid: u32,
    pub pgid: u32,
}

impl ManagedProcess {
    /// Spawn a new process in its own session
    pub fn spawn(command: &CommandSpec, options: SpawnOptions) -> HostResult<Self> {
        if command.argv().is_empty() {
            return Err(HostError::SpawnFailed(format!(
                "Empty argv for {}",
                command.name()
            )));
        }

        let program = command.program();
        let mut cmd = Command::new(program);
        cmd.args(command.args());

        // The session inherits the full graphical environment (DISPLAY, XAUTHORITY, ...)
        cmd.stdin(Stdio::null());
        cmd.stdout(options.stdout.map(Stdio::from).unwrap_or_else(Stdio::null));
        cmd.stderr(options.stderr.map(Stdio::from).unwrap_or_else(Stdio::null));

        // SAFETY: setsid is async-signal-safe and touches no parent state
        unsafe {
            cmd.pre_exec(|| {
                // New session, so the child leads a new process group and
                // is detached from the supervisor's controlling terminal
                nix::unistd::setsid().map_err(std::io::Error::from)?;
                Ok(())
            });
        }

        let child = cmd.spawn().map_err(|e| {
            HostError::SpawnFailed(format!("Failed to spawn {}: {}", program, e))
        })?;

        let pid = child.id();
        let pgid = pid; // After setsid, pid == pgid

        debug!(pid = pid, pgid = pgid, program = %program, "Process spawned");

        Ok(Self { child, pid, pgid })
    }

    /// Send a signal to the process group
    pub fn signal_group(&self, signal: Signal) -> HostResult<Delivery> {
        send_group_signal(self.pgid, signal)
    }

    /// Check if the process has exited (non-blocking)
    pub fn try_wait(&mut self) -> HostResult<Option<ExitStatus>> {
        Ok(self.child.try_wait()?.map(ExitStatus::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn wait_for_exit(proc: &mut ManagedProcess) -> ExitStatus {
        for _ in 0..100 {
            if let Some(status) = proc.try_wait().unwrap() {
                return status;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        panic!("process {} did not exit", proc.pid);
    }

    #[test]
    fn spawn_simple_process() {
        let cmd = CommandSpec::new("test", ["true"]);
        let mut proc = ManagedProcess::spawn(&cmd, SpawnOptions::default()).unwrap();

        assert_eq!(proc.pid, proc.pgid);
        assert!(wait_for_exit(&mut proc).is_success());
    }

    #[test]
    fn spawn_redirects_output() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("out.log");
        let out = std::fs::File::create(&out_path).unwrap();

        let cmd = CommandSpec::new("test", ["echo", "hello"]);
        let options = SpawnOptions {
            stdout: Some(out),
            stderr: None,
        };
        let mut proc = ManagedProcess::spawn(&cmd, options).unwrap();
        assert!(wait_for_exit(&mut proc).is_success());

        assert_eq!(std::fs::read_to_string(out_path).unwrap(), "hello\n");
    }

    #[test]
    fn spawn_missing_program_fails() {
        let cmd = CommandSpec::new("test", ["/nonexistent/bpsession-test-binary"]);
        let result = ManagedProcess::spawn(&cmd, SpawnOptions::default());
        assert!(matches!(result, Err(HostError::SpawnFailed(_))));
    }

    #[test]
    fn terminate_sleeping_process_group() {
        let cmd = CommandSpec::new("test", ["sleep", "60"]);
        let mut proc = ManagedProcess::spawn(&cmd, SpawnOptions::default()).unwrap();

        std::thread::sleep(Duration::from_millis(50));

        assert_eq!(proc.signal_group(Signal::Terminate).unwrap(), Delivery::Delivered);
        let status = wait_for_exit(&mut proc);
        assert_eq!(status.signal, Some(15));

        // Reaped, so the group is gone
        assert_eq!(proc.signal_group(Signal::Terminate).unwrap(), Delivery::AlreadyGone);
    }

    #[test]
    fn refuses_pid_zero() {
        assert!(matches!(
            send_signal(0, Signal::Terminate),
            Err(HostError::SignalFailed(_))
        ));
        assert!(send_group_signal(u32::MAX, Signal::Kill).is_err());
    }
}
