//! Session log sinks

use bpsession_host_api::SpawnOptions;
use bpsession_util::{LogPaths, Result, SessionError};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One open log file
#[derive(Debug)]
struct LogSink {
    file: File,
    path: PathBuf,
}

impl LogSink {
    fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SessionError::log_io(path, e))?;
        }
        let file = File::create(path).map_err(|e| SessionError::log_io(path, e))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    fn duplicate(&self) -> Result<File> {
        self.file
            .try_clone()
            .map_err(|e| SessionError::log_io(&self.path, e))
    }

    fn close(self) {
        if let Err(e) = self.file.sync_all() {
            warn!(path = %self.path.display(), error = %e, "Failed to flush log file");
        }
    }
}

/// Open log files for window-manager and target-application output.
///
/// Opened write-truncate when the session starts; children receive duplicated
/// descriptors, the originals are synced and closed at teardown.
#[derive(Debug)]
pub struct SessionLogs {
    window_manager_stdout: LogSink,
    window_manager_stderr: LogSink,
    target_stdout: LogSink,
    target_stderr: LogSink,
}

impl SessionLogs {
    pub fn open(paths: &LogPaths) -> Result<Self> {
        Ok(Self {
            window_manager_stdout: LogSink::open(&paths.window_manager_stdout)?,
            window_manager_stderr: LogSink::open(&paths.window_manager_stderr)?,
            target_stdout: LogSink::open(&paths.target_stdout)?,
            target_stderr: LogSink::open(&paths.target_stderr)?,
        })
    }

    /// Output redirection for the window manager
    pub fn window_manager_sinks(&self) -> Result<SpawnOptions> {
        Ok(SpawnOptions {
            stdout: Some(self.window_manager_stdout.duplicate()?),
            stderr: Some(self.window_manager_stderr.duplicate()?),
        })
    }

    /// Output redirection for the target application
    pub fn target_sinks(&self) -> Result<SpawnOptions> {
        Ok(SpawnOptions {
            stdout: Some(self.target_stdout.duplicate()?),
            stderr: Some(self.target_stderr.duplicate()?),
        })
    }

    /// Flush and close every sink. Failures are logged; teardown continues.
    pub fn close(self) {
        self.window_manager_stdout.close();
        self.window_manager_stderr.close();
        self.target_stdout.close();
        self.target_stderr.close();
        debug!("Session logs closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn open_truncates_previous_session_output() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LogPaths::in_dir(dir.path().join("logs"));
        fs::create_dir_all(dir.path().join("logs")).unwrap();
        fs::write(&paths.target_stdout, "old session output").unwrap();

        let logs = SessionLogs::open(&paths).unwrap();
        logs.close();

        assert_eq!(fs::read_to_string(&paths.target_stdout).unwrap(), "");
        assert!(paths.window_manager_stderr.exists());
    }

    #[test]
    fn sinks_write_to_their_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LogPaths::in_dir(dir.path());
        let logs = SessionLogs::open(&paths).unwrap();

        let mut wm = logs.window_manager_sinks().unwrap();
        let mut target = logs.target_sinks().unwrap();
        wm.stderr.as_mut().unwrap().write_all(b"wm warning\n").unwrap();
        target.stdout.as_mut().unwrap().write_all(b"steam started\n").unwrap();
        drop(wm);
        drop(target);
        logs.close();

        assert_eq!(fs::read_to_string(&paths.window_manager_stderr).unwrap(), "wm warning\n");
        assert_eq!(fs::read_to_string(&paths.target_stdout).unwrap(), "steam started\n");
        assert_eq!(fs::read_to_string(&paths.window_manager_stdout).unwrap(), "");
    }

    #[test]
    fn open_fails_for_unwritable_dir() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();

        let err = SessionLogs::open(&LogPaths::in_dir(blocker.join("logs"))).unwrap_err();
        assert!(matches!(err, SessionError::LogIo { .. }));
    }
}
