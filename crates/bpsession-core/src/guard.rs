//! Instance guard: the pid file recording the supervising process
//!
//! The pid file is the only cross-invocation record of an active session. It
//! is written by the session monitor at startup and removed by whichever
//! invocation ends the session. There is no lock: a coordinator can read a
//! pid just as the monitor releases the file, in which case signaling it
//! finds the process already gone.

use bpsession_util::{Result, SessionError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Single-slot, file-backed record of the supervising process id
#[derive(Debug, Clone)]
pub struct InstanceGuard {
    path: PathBuf,
}

impl InstanceGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record `pid` as the supervisor, replacing any previous record.
    ///
    /// Written to a sibling file and renamed into place, so readers never see
    /// a partial pid.
    pub fn acquire(&self, pid: u32) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SessionError::pid_file_io(&self.path, e))?;
        }

        let tmp = self.temp_path();
        fs::write(&tmp, format!("{}\n", pid)).map_err(|e| SessionError::pid_file_io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            SessionError::pid_file_io(&self.path, e)
        })?;

        info!(pid = pid, path = %self.path.display(), "Instance guard acquired");
        Ok(())
    }

    /// Delete the pid file. Already absent is success.
    pub fn release(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Instance guard released");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Pid file already absent");
                Ok(())
            }
            Err(e) => Err(SessionError::pid_file_io(&self.path, e)),
        }
    }

    /// Read the recorded supervisor pid.
    pub fn read_supervisor_pid(&self) -> Result<u32> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SessionError::PidFileMissing(self.path.clone()));
            }
            Err(e) => return Err(SessionError::pid_file_io(&self.path, e)),
        };

        match content.trim().parse::<u32>() {
            Ok(pid) if pid > 0 => Ok(pid),
            _ => Err(SessionError::PidFileMalformed {
                path: self.path.clone(),
                content,
            }),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard_in(dir: &tempfile::TempDir) -> InstanceGuard {
        InstanceGuard::new(dir.path().join("run").join("bpsession.pid"))
    }

    #[test]
    fn acquire_writes_pid() {
        let dir = tempfile::tempdir().unwrap();
        let guard = guard_in(&dir);

        guard.acquire(4321).unwrap();

        assert_eq!(fs::read_to_string(guard.path()).unwrap(), "4321\n");
        assert_eq!(guard.read_supervisor_pid().unwrap(), 4321);
        assert!(!guard.temp_path().exists());
    }

    #[test]
    fn acquire_overwrites_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let guard = guard_in(&dir);

        guard.acquire(1).unwrap();
        guard.acquire(2).unwrap();

        assert_eq!(guard.read_supervisor_pid().unwrap(), 2);
    }

    #[test]
    fn acquire_release_release_is_safe() {
        let dir = tempfile::tempdir().unwrap();
        let guard = guard_in(&dir);

        guard.acquire(77).unwrap();
        guard.release().unwrap();
        guard.release().unwrap();

        assert!(!guard.path().exists());
    }

    #[test]
    fn read_after_release_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let guard = guard_in(&dir);

        guard.acquire(77).unwrap();
        guard.release().unwrap();

        let err = guard.read_supervisor_pid().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn malformed_content_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let guard = InstanceGuard::new(dir.path().join("bpsession.pid"));

        for content in ["abc", "", "-5", "0", "12 34"] {
            fs::write(guard.path(), content).unwrap();
            let err = guard.read_supervisor_pid().unwrap_err();
            assert!(
                matches!(err, SessionError::PidFileMalformed { .. }),
                "content {content:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let guard = InstanceGuard::new(dir.path().join("bpsession.pid"));

        fs::write(guard.path(), "  812 \n").unwrap();
        assert_eq!(guard.read_supervisor_pid().unwrap(), 812);
    }

    #[test]
    fn acquire_fails_when_path_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        // The parent "directory" is a regular file
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let guard = InstanceGuard::new(blocker.join("bpsession.pid"));

        let err = guard.acquire(1).unwrap_err();
        assert!(matches!(err, SessionError::PidFileIo { .. }));
    }
}
