//! bpsession - big picture session supervisor
//!
//! Without arguments, starts the window manager and the Steam client as a
//! substitute graphical session and supervises it until Steam exits. With
//! `--kill-steam`/`--logout`, shuts a running session down from a separate
//! invocation, escalating from a graceful request to killing the supervisor.

use anyhow::{Context, Result};
use bpsession_config::{LaunchConfig, load_settings};
use bpsession_core::{
    InstanceGuard, SessionLogs, SessionMonitor, TerminationCoordinator, build_commands,
    parse_grace_delay,
};
use bpsession_host_linux::LinuxHost;
use bpsession_util::{LogPaths, SessionError, default_pid_file_path, default_settings_path};
use clap::{CommandFactory, Parser};
use std::future::Future;
use std::process::ExitCode;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// bpsession - run Steam big picture as a desktop session
#[derive(Parser, Debug)]
#[command(name = "bpsession")]
#[command(about = "Run Steam big picture as a desktop session", long_about = None)]
struct Args {
    /// Print version
    #[arg(short = 'v', long)]
    version: bool,

    /// Shut down the running session, optionally after DELAY seconds
    #[arg(
        short = 'k',
        long = "kill-steam",
        value_name = "DELAY",
        num_args = 0..=1,
        allow_negative_numbers = true,
        conflicts_with = "logout"
    )]
    kill_steam: Option<Option<String>>,

    /// Same as --kill-steam
    #[arg(
        short = 'l',
        long,
        value_name = "DELAY",
        num_args = 0..=1,
        allow_negative_numbers = true
    )]
    logout: Option<Option<String>>,
}

/// What this invocation does
#[derive(Debug, PartialEq)]
enum Mode {
    Version,
    Supervise,
    Terminate { delay: Option<Duration> },
}

impl Args {
    /// Resolve the invocation mode. Validation happens here, before any side effect.
    fn mode(&self) -> Result<Mode, SessionError> {
        if self.version {
            return Ok(Mode::Version);
        }

        match self.kill_steam.as_ref().or(self.logout.as_ref()) {
            None => Ok(Mode::Supervise),
            Some(None) => Ok(Mode::Terminate { delay: None }),
            Some(Some(raw)) => Ok(Mode::Terminate {
                delay: Some(parse_grace_delay(raw)?),
            }),
        }
    }
}

/// Run the session monitor until the session ends
async fn supervise() -> Result<()> {
    let settings_path = default_settings_path();
    let config = load_settings(&settings_path)
        .with_context(|| format!("Failed to load settings from {:?}", settings_path))?;
    info!(?config, "Settings loaded");

    let commands = build_commands(&config);
    let guard = InstanceGuard::new(default_pid_file_path());
    let log_paths = LogPaths::default();
    let logs = SessionLogs::open(&log_paths).context("Failed to open session logs")?;
    let shutdown = termination_signal()?;

    let host = LinuxHost::new();
    let mut monitor = SessionMonitor::new(&host, &guard, &commands);
    let reason = monitor.run(logs, shutdown).await.context("Session failed")?;

    info!(?reason, "Session ended");
    Ok(())
}

/// Run the termination cascade against the running session
async fn terminate(delay: Option<Duration>) -> Result<()> {
    // The shutdown command does not depend on settings
    let commands = build_commands(&LaunchConfig::default());
    let guard = InstanceGuard::new(default_pid_file_path());

    let host = LinuxHost::new();
    let mut coordinator = TerminationCoordinator::new(&host, &guard, &commands);
    let escalation = coordinator
        .run(delay)
        .await
        .context("Failed to shut down the session")?;

    info!(?escalation, "Shutdown complete");
    Ok(())
}

/// Resolves on SIGTERM, SIGINT or SIGHUP.
///
/// Handlers are installed immediately so a signal arriving during launch is
/// held until the monitor starts watching for it.
fn termination_signal() -> Result<impl Future<Output = ()>> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
    let mut sighup = signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, tearing down"),
            _ = sigint.recv() => info!("Received SIGINT, tearing down"),
            _ = sighup.recv() => info!("Received SIGHUP, tearing down"),
        }
    })
}

/// One-line diagnostic followed by the full usage text
fn print_usage_error(diagnostic: impl std::fmt::Display) {
    eprintln!("bpsession: {}", diagnostic);
    eprintln!();
    eprintln!("{}", Args::command().render_help());
}

/// First line of a clap error, without its own usage section
fn clap_diagnostic(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    let line = rendered.lines().next().unwrap_or_default();
    line.strip_prefix("error: ").unwrap_or(line).to_string()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        // --help
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            print_usage_error(clap_diagnostic(&e));
            return ExitCode::from(2);
        }
    };

    let mode = match args.mode() {
        Ok(mode) => mode,
        Err(e) => {
            print_usage_error(&e);
            return ExitCode::from(1);
        }
    };

    if mode == Mode::Version {
        println!("bpsession {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), ?mode, "bpsession starting");

    let result = match mode {
        Mode::Terminate { delay } => terminate(delay).await,
        _ => supervise().await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "bpsession failed");
            ExitCode::FAILURE
        }
    }
}
