//! Linux host implementation

use async_trait::async_trait;
use bpsession_host_api::{
    CommandSpec, Delivery, ExitStatus, HostError, HostResult, ProcessHandle, ScanResult,
    SessionHost, Signal, SpawnOptions,
};
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::process::{ManagedProcess, send_group_signal, send_signal};
use crate::scan::scan_processes;

/// Linux host
pub struct LinuxHost {
    /// Detached children, kept so they can be reaped
    processes: Mutex<HashMap<u32, ManagedProcess>>,
    own_pid: u32,
}

impl LinuxHost {
    pub fn new() -> Self {
        Self {
            processes: Mutex::new(HashMap::new()),
            own_pid: std::process::id(),
        }
    }

    fn processes(&self) -> MutexGuard<'_, HashMap<u32, ManagedProcess>> {
        self.processes.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reap detached children that have exited so they do not linger as zombies
    fn reap_exited(&self) {
        let mut procs = self.processes();
        let mut exited = Vec::new();

        for (pid, proc) in procs.iter_mut() {
            match proc.try_wait() {
                Ok(Some(status)) => exited.push((*pid, status)),
                Ok(None) => {}
                Err(e) => {
                    warn!(pid = pid, error = %e, "Error checking process status");
                }
            }
        }

        for (pid, status) in exited {
            procs.remove(&pid);
            info!(pid = pid, status = %status, "Detached process exited");
        }
    }
}

impl Default for LinuxHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionHost for LinuxHost {
    fn scan(&self, name: &str) -> ScanResult {
        self.reap_exited();
        scan_processes(name, self.own_pid)
    }

    fn spawn_detached(
        &self,
        command: &CommandSpec,
        options: SpawnOptions,
    ) -> HostResult<ProcessHandle> {
        let proc = ManagedProcess::spawn(command, options)?;
        let handle = ProcessHandle::new(proc.pid, proc.pgid);

        info!(
            role = command.name(),
            pid = proc.pid,
            command = %command,
            "Spawned detached process"
        );

        self.processes().insert(proc.pid, proc);
        Ok(handle)
    }

    async fn run(&self, command: &CommandSpec) -> HostResult<ExitStatus> {
        if command.argv().is_empty() {
            return Err(HostError::SpawnFailed(format!(
                "Empty argv for {}",
                command.name()
            )));
        }

        debug!(role = command.name(), command = %command, "Running command");

        let status = tokio::process::Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| {
                HostError::SpawnFailed(format!("Failed to run {}: {}", command.program(), e))
            })?;

        Ok(ExitStatus::from(status))
    }

    fn signal(&self, pid: u32, signal: Signal) -> HostResult<Delivery> {
        send_signal(pid, signal)
    }

    fn stop(&self, handle: &ProcessHandle, signal: Signal) -> HostResult<Delivery> {
        let delivery = send_group_signal(handle.pgid, signal)?;
        if delivery == Delivery::AlreadyGone {
            // Group gone; the leader may still need reaping
            self.reap_exited();
        }
        Ok(delivery)
    }

    fn program_exists(&self, program: &str) -> bool {
        if program.contains('/') {
            return Path::new(program).is_file();
        }

        std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
            .unwrap_or(false)
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn own_pid(&self) -> u32 {
        self.own_pid
    }
}
