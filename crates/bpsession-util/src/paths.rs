//! Default paths for bpsession
//!
//! Paths are user-writable by default (no root required):
//! - Pid file: `$XDG_RUNTIME_DIR/bpsession/bpsession.pid` or `/tmp/bpsession-$USER/bpsession.pid`
//! - Logs: `$XDG_STATE_HOME/bpsession` or `~/.local/state/bpsession`
//! - Settings: `$XDG_CONFIG_HOME/bpsession/settings.json` or `~/.config/bpsession/settings.json`

use std::path::{Path, PathBuf};

/// Environment variable for overriding the pid file path
pub const BPSESSION_PID_FILE_ENV: &str = "BPSESSION_PID_FILE";

/// Environment variable for overriding the settings document path
pub const BPSESSION_CONFIG_ENV: &str = "BPSESSION_CONFIG";

/// Pid file name within the runtime directory
const PID_FILENAME: &str = "bpsession.pid";

/// Settings file name within the config directory
const SETTINGS_FILENAME: &str = "settings.json";

/// Application subdirectory name
const APP_DIR: &str = "bpsession";

/// Get the default pid file path.
///
/// Order of precedence:
/// 1. `$BPSESSION_PID_FILE` environment variable (if set)
/// 2. `$XDG_RUNTIME_DIR/bpsession/bpsession.pid` (if XDG_RUNTIME_DIR is set)
/// 3. `/tmp/bpsession-$USER/bpsession.pid` (fallback)
pub fn default_pid_file_path() -> PathBuf {
    if let Ok(path) = std::env::var(BPSESSION_PID_FILE_ENV) {
        return PathBuf::from(path);
    }

    pid_file_path_without_env()
}

/// Get the pid file path without checking the BPSESSION_PID_FILE env var.
pub fn pid_file_path_without_env() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join(APP_DIR).join(PID_FILENAME);
    }

    let username = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/{}-{}", APP_DIR, username)).join(PID_FILENAME)
}

/// Get the default log directory.
///
/// Order of precedence:
/// 1. `$XDG_STATE_HOME/bpsession` (if XDG_STATE_HOME is set)
/// 2. `~/.local/state/bpsession` (fallback)
pub fn default_log_dir() -> PathBuf {
    if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(state_home).join(APP_DIR);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".local").join("state").join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("logs")
}

/// Get the default settings document path.
///
/// Order of precedence:
/// 1. `$BPSESSION_CONFIG` environment variable (if set)
/// 2. `<config dir>/bpsession/settings.json`
pub fn default_settings_path() -> PathBuf {
    if let Ok(path) = std::env::var(BPSESSION_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp").join(APP_DIR))
        .join(APP_DIR)
        .join(SETTINGS_FILENAME)
}

/// Fixed log file locations for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPaths {
    pub window_manager_stdout: PathBuf,
    pub window_manager_stderr: PathBuf,
    pub target_stdout: PathBuf,
    pub target_stderr: PathBuf,
}

impl LogPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            window_manager_stdout: dir.join("window-manager.out.log"),
            window_manager_stderr: dir.join("window-manager.err.log"),
            target_stdout: dir.join("steam.out.log"),
            target_stderr: dir.join("steam.err.log"),
        }
    }
}

impl Default for LogPaths {
    fn default() -> Self {
        Self::in_dir(default_log_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_file_path_contains_bpsession() {
        let path = pid_file_path_without_env();
        assert!(path.to_string_lossy().contains("bpsession"));
        assert!(path.to_string_lossy().ends_with(".pid"));
    }

    #[test]
    fn log_dir_contains_bpsession() {
        let path = default_log_dir();
        assert!(path.to_string_lossy().contains("bpsession"));
    }

    #[test]
    fn log_paths_are_distinct_and_share_a_dir() {
        let logs = LogPaths::in_dir("/var/tmp/bp");
        let all = [
            &logs.window_manager_stdout,
            &logs.window_manager_stderr,
            &logs.target_stdout,
            &logs.target_stderr,
        ];
        for (i, a) in all.iter().enumerate() {
            assert_eq!(a.parent(), Some(Path::new("/var/tmp/bp")));
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
