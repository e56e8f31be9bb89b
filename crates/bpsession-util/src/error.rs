//! Error types for bpsession

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for session operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Launch error: {0}")]
    LaunchError(String),

    #[error("No session pid file at {}", .0.display())]
    PidFileMissing(PathBuf),

    #[error("Malformed pid file {}: {content:?}", .path.display())]
    PidFileMalformed { path: PathBuf, content: String },

    #[error("Pid file {}: {source}", .path.display())]
    PidFileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Log file {}: {source}", .path.display())]
    LogIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SessionError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn launch(msg: impl Into<String>) -> Self {
        Self::LaunchError(msg.into())
    }

    pub fn pid_file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PidFileIo {
            path: path.into(),
            source,
        }
    }

    pub fn log_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LogIo {
            path: path.into(),
            source,
        }
    }

    /// Whether this error only says "no session is recorded".
    ///
    /// Teardown paths treat this as the already-terminated state.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PidFileMissing(_))
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_only_for_missing_pid_file() {
        assert!(SessionError::PidFileMissing(PathBuf::from("/tmp/x.pid")).is_not_found());
        assert!(!SessionError::validation("bad").is_not_found());
        assert!(
            !SessionError::PidFileMalformed {
                path: PathBuf::from("/tmp/x.pid"),
                content: "abc".into(),
            }
            .is_not_found()
        );
    }

    #[test]
    fn messages_carry_context() {
        let err = SessionError::launch("xset -dpms exited with status 1");
        assert_eq!(err.to_string(), "Launch error: xset -dpms exited with status 1");

        let err = SessionError::PidFileMissing(PathBuf::from("/run/user/1000/bpsession/bpsession.pid"));
        assert!(err.to_string().contains("/run/user/1000/bpsession/bpsession.pid"));
    }
}
