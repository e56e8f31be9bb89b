//! Process table scanning

use bpsession_host_api::{ScanResult, name_matches};
use sysinfo::{ProcessRefreshKind, ProcessStatus, System};

/// Snapshot the process table and return live processes whose name contains
/// `name`, case-insensitively. `exclude` is never reported.
///
/// Processes that exit mid-scan or whose name cannot be read simply do not
/// appear in the snapshot; zombies are skipped. On Linux the snapshot also
/// lists every thread under its tid; only thread-group leaders are reported,
/// so a multi-threaded process counts once.
pub fn scan_processes(name: &str, exclude: u32) -> ScanResult {
    let mut sys = System::new();
    // Names and pids only; no cpu, memory or environment
    sys.refresh_processes_specifics(ProcessRefreshKind::new());

    let pids = sys
        .processes()
        .iter()
        .filter(|(_, process)| process.thread_kind().is_none())
        .filter(|(_, process)| process.status() != ProcessStatus::Zombie)
        .filter(|(pid, process)| pid.as_u32() != exclude && name_matches(process.name(), name))
        .map(|(pid, _)| pid.as_u32())
        .collect();

    ScanResult::new(pids)
}
