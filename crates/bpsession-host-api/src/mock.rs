//! Mock host for testing
//!
//! Keeps an in-memory process table and a virtual clock. `sleep` advances the
//! clock instantly, so session timelines run without real delays.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::{
    CommandSpec, Delivery, ExitStatus, HostError, HostResult, ProcessHandle, ScanResult,
    SessionHost, Signal, SpawnOptions, name_matches,
};

/// Pid reported by [`MockHost::own_pid`]
pub const MOCK_OWN_PID: u32 = 1000;

/// A host interaction, recorded in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Spawn(Vec<String>),
    Run(Vec<String>),
    Signal { pid: u32, signal: Signal },
    Stop { pid: u32, signal: Signal },
    Sleep(Duration),
}

/// Mock process table entry
#[derive(Debug, Clone)]
pub struct MockProcess {
    pub pid: u32,
    pub name: String,
    pub alive: bool,
    /// Virtual time at which the process exits on its own
    pub exits_at: Option<Duration>,
}

#[derive(Debug, Default)]
struct MockState {
    clock: Duration,
    next_pid: u32,
    processes: Vec<MockProcess>,
    calls: Vec<HostCall>,
    exit_codes: HashMap<Vec<String>, i32>,
    existing_programs: HashSet<String>,
    failing_spawns: HashSet<String>,
    lifetimes: HashMap<String, Duration>,
    signal_resistant: HashSet<String>,
    /// (argv, process name): running argv makes matching processes exit
    exit_on_run: Vec<(Vec<String>, String)>,
}

impl MockState {
    fn expire(&mut self) {
        let now = self.clock;
        for proc in &mut self.processes {
            if proc.alive && proc.exits_at.is_some_and(|at| at <= now) {
                proc.alive = false;
            }
        }
    }

    fn deliver(&mut self, pid: u32) -> Delivery {
        let resistant = &self.signal_resistant;
        match self.processes.iter_mut().find(|p| p.pid == pid && p.alive) {
            Some(proc) => {
                if !resistant.contains(&proc.name) {
                    proc.alive = false;
                }
                Delivery::Delivered
            }
            None => Delivery::AlreadyGone,
        }
    }
}

/// Mock host for unit/integration testing
#[derive(Clone)]
pub struct MockHost {
    state: Arc<Mutex<MockState>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                next_pid: 2000,
                ..Default::default()
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the recorded calls
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add a running process to the table, returning its pid
    pub fn add_process(&self, name: &str) -> u32 {
        let mut state = self.state();
        let pid = state.next_pid;
        state.next_pid += 1;
        state.processes.push(MockProcess {
            pid,
            name: name.to_string(),
            alive: true,
            exits_at: None,
        });
        pid
    }

    /// Processes named `name` ignore every signal
    pub fn set_signal_resistant(&self, name: &str) {
        self.state().signal_resistant.insert(name.to_string());
    }

    /// Processes named `name` exit when a command with this argv is run
    pub fn exit_on_run(&self, argv: &[&str], name: &str) {
        let argv = argv.iter().map(|s| s.to_string()).collect();
        self.state().exit_on_run.push((argv, name.to_string()));
    }

    /// Running this argv returns the given exit code (default 0)
    pub fn set_exit_code(&self, argv: &[&str], code: i32) {
        let argv = argv.iter().map(|s| s.to_string()).collect();
        self.state().exit_codes.insert(argv, code);
    }

    /// Mark a program as present on disk
    pub fn add_program(&self, program: &str) {
        self.state().existing_programs.insert(program.to_string());
    }

    /// Spawning this program fails
    pub fn fail_spawn(&self, program: &str) {
        self.state().failing_spawns.insert(program.to_string());
    }

    /// Spawned processes named `name` exit `lifetime` after being spawned
    pub fn set_lifetime(&self, name: &str, lifetime: Duration) {
        self.state().lifetimes.insert(name.to_string(), lifetime);
    }

    /// Recorded interactions, in order
    pub fn calls(&self) -> Vec<HostCall> {
        self.state().calls.clone()
    }

    /// Argv of every spawned or run command, in order
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                HostCall::Spawn(argv) | HostCall::Run(argv) => Some(argv.clone()),
                _ => None,
            })
            .collect()
    }

    /// Current virtual time
    pub fn clock(&self) -> Duration {
        self.state().clock
    }

    pub fn is_alive(&self, pid: u32) -> bool {
        self.state()
            .processes
            .iter()
            .any(|p| p.pid == pid && p.alive)
    }

    pub fn processes(&self) -> Vec<MockProcess> {
        self.state().processes.clone()
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionHost for MockHost {
    fn scan(&self, name: &str) -> ScanResult {
        let state = self.state();
        ScanResult::new(
            state
                .processes
                .iter()
                .filter(|p| p.alive && p.pid != MOCK_OWN_PID && name_matches(&p.name, name))
                .map(|p| p.pid)
                .collect(),
        )
    }

    fn spawn_detached(
        &self,
        command: &CommandSpec,
        _options: SpawnOptions,
    ) -> HostResult<ProcessHandle> {
        let mut state = self.state();
        state.calls.push(HostCall::Spawn(command.argv().to_vec()));

        if command.program().is_empty() || state.failing_spawns.contains(command.program()) {
            return Err(HostError::SpawnFailed(format!(
                "Failed to spawn {}: mock spawn failure",
                command.program()
            )));
        }

        let name = Path::new(command.program())
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let exits_at = state.lifetimes.get(&name).map(|life| state.clock + *life);
        let pid = state.next_pid;
        state.next_pid += 1;
        state.processes.push(MockProcess {
            pid,
            name,
            alive: true,
            exits_at,
        });

        Ok(ProcessHandle::new(pid, pid))
    }

    async fn run(&self, command: &CommandSpec) -> HostResult<ExitStatus> {
        let mut state = self.state();
        let argv = command.argv().to_vec();
        state.calls.push(HostCall::Run(argv.clone()));

        let exiting: Vec<String> = state
            .exit_on_run
            .iter()
            .filter(|(trigger, _)| *trigger == argv)
            .map(|(_, name)| name.clone())
            .collect();
        for proc in &mut state.processes {
            if exiting.contains(&proc.name) {
                proc.alive = false;
            }
        }

        let code = state.exit_codes.get(&argv).copied().unwrap_or(0);
        Ok(ExitStatus::with_code(code))
    }

    fn signal(&self, pid: u32, signal: Signal) -> HostResult<Delivery> {
        let mut state = self.state();
        state.calls.push(HostCall::Signal { pid, signal });
        Ok(state.deliver(pid))
    }

    fn stop(&self, handle: &ProcessHandle, signal: Signal) -> HostResult<Delivery> {
        let mut state = self.state();
        state.calls.push(HostCall::Stop {
            pid: handle.pid,
            signal,
        });
        Ok(state.deliver(handle.pid))
    }

    fn program_exists(&self, program: &str) -> bool {
        self.state().existing_programs.contains(program)
    }

    async fn sleep(&self, duration: Duration) {
        let mut state = self.state();
        state.calls.push(HostCall::Sleep(duration));
        state.clock += duration;
        state.expire();
    }

    fn own_pid(&self) -> u32 {
        MOCK_OWN_PID
    }
}
