//! Session launcher
//!
//! Builds the fixed command vectors from a [`LaunchConfig`] and runs the
//! startup sequence: window manager, optional vendor display configuration,
//! power-management toggles, then the target application, with fixed settle
//! delays in between.

use bpsession_config::LaunchConfig;
use bpsession_host_api::{CommandSpec, ProcessHandle, SessionHost, Signal};
use bpsession_util::{Result, SessionError};
use std::time::Duration;
use tracing::{info, warn};

use crate::SessionLogs;

/// Name substring identifying the target application's processes
pub const TARGET_PROCESS_NAME: &str = "steam";

/// Vendor display configuration, run only when installed
pub const DISPLAY_CONFIG_PROGRAM: &str = "/usr/bin/nvidia-settings";

/// Lets the window manager initialize before display configuration
pub const WINDOW_MANAGER_SETTLE: Duration = Duration::from_millis(100);

/// After the power-management toggles, before the target starts
pub const POWER_SETTLE: Duration = Duration::from_millis(250);

/// After the target spawns, so the first liveness scan does not race it
pub const TARGET_SETTLE: Duration = Duration::from_secs(3);

/// Every command a session needs, built once per invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCommands {
    pub window_manager: CommandSpec,
    pub display_config: CommandSpec,
    pub dpms_off: CommandSpec,
    pub blanking_off: CommandSpec,
    pub target: CommandSpec,
    pub target_shutdown: CommandSpec,
}

/// Build the session's command vectors from the resolved configuration.
pub fn build_commands(config: &LaunchConfig) -> SessionCommands {
    let compositor = if config.compositor {
        "--compositor=on"
    } else {
        "--compositor=off"
    };

    let mut target = vec!["steam", "-bigpicture"];
    if config.steam_os_mode {
        target.push(if config.on_deck { "-steamos3" } else { "-steamos" });
    }
    if config.on_deck {
        target.push("-steamdeck");
    }
    if !config.deck_ui_mode {
        target.push("-oldbigpicture");
    }

    SessionCommands {
        window_manager: CommandSpec::new("window-manager", ["xfwm4", "--replace", compositor]),
        display_config: CommandSpec::new(
            "display-config",
            [DISPLAY_CONFIG_PROGRAM, "--load-config-only"],
        ),
        dpms_off: CommandSpec::new("dpms-off", ["xset", "-dpms"]),
        blanking_off: CommandSpec::new("blanking-off", ["xset", "s", "off"]),
        target: CommandSpec::new("target", target),
        target_shutdown: CommandSpec::new("target-shutdown", ["steam", "-shutdown"]),
    }
}

/// Processes started by [`launch`]
#[derive(Debug, Clone, Copy)]
pub struct LaunchedSession {
    pub window_manager: ProcessHandle,
    /// Informational only: liveness of the target is tracked by name
    pub target: ProcessHandle,
}

/// Run the startup sequence.
///
/// If a step fails after the window manager started, the window manager is
/// stopped before the error is returned.
pub async fn launch<H>(
    host: &H,
    commands: &SessionCommands,
    logs: &SessionLogs,
) -> Result<LaunchedSession>
where
    H: SessionHost + ?Sized,
{
    let window_manager = host
        .spawn_detached(&commands.window_manager, logs.window_manager_sinks()?)
        .map_err(|e| SessionError::launch(format!("{}: {}", commands.window_manager.name(), e)))?;
    info!(pid = window_manager.pid, "Window manager started");

    match launch_after_window_manager(host, commands, logs).await {
        Ok(target) => Ok(LaunchedSession {
            window_manager,
            target,
        }),
        Err(e) => {
            warn!(error = %e, "Launch failed, stopping window manager");
            if let Err(stop_err) = host.stop(&window_manager, Signal::Terminate) {
                warn!(error = %stop_err, "Failed to stop window manager");
            }
            Err(e)
        }
    }
}

async fn launch_after_window_manager<H>(
    host: &H,
    commands: &SessionCommands,
    logs: &SessionLogs,
) -> Result<ProcessHandle>
where
    H: SessionHost + ?Sized,
{
    if host.program_exists(commands.display_config.program()) {
        run_required(host, &commands.display_config).await?;
    } else {
        info!(program = commands.display_config.program(), "No display configuration tool, skipping");
    }

    host.sleep(WINDOW_MANAGER_SETTLE).await;

    run_required(host, &commands.dpms_off).await?;
    run_required(host, &commands.blanking_off).await?;

    host.sleep(POWER_SETTLE).await;

    let target = host
        .spawn_detached(&commands.target, logs.target_sinks()?)
        .map_err(|e| SessionError::launch(format!("{}: {}", commands.target.name(), e)))?;
    info!(pid = target.pid, command = %commands.target, "Target application started");

    host.sleep(TARGET_SETTLE).await;

    Ok(target)
}

/// Run a command to completion; anything but exit status 0 is a launch error.
pub(crate) async fn run_required<H>(host: &H, command: &CommandSpec) -> Result<()>
where
    H: SessionHost + ?Sized,
{
    let status = host
        .run(command)
        .await
        .map_err(|e| SessionError::launch(format!("{}: {}", command.name(), e)))?;

    if !status.is_success() {
        return Err(SessionError::launch(format!(
            "{} ({}) failed with {}",
            command.name(),
            command,
            status
        )));
    }

    info!(role = command.name(), "Command completed");
    Ok(())
}
