use git2::Oid;
use thiserror::Error;

/// Unified error type for version resolution
#[derive(Error, Debug)]
pub enum VersionError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transient repository error during {operation}: {message}")]
    Transient { operation: String, message: String },

    #[error("{operation} failed after {} attempts", attempts.len())]
    RetryExhausted {
        operation: String,
        attempts: Vec<VersionError>,
    },

    #[error("No common ancestor between {left} and {right}")]
    UnrelatedHistory { left: Oid, right: Oid },

    #[error("Commit not found: {0}")]
    CommitNotFound(Oid),

    #[error("Version error: {0}")]
    Version(String),

    #[error("Resolution failed: {0}")]
    Resolution(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in git-semver
pub type Result<T> = std::result::Result<T, VersionError>;

impl VersionError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        VersionError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        VersionError::Version(msg.into())
    }

    /// Create a resolution error with context
    pub fn resolution(msg: impl Into<String>) -> Self {
        VersionError::Resolution(msg.into())
    }

    /// Create a transient repository error
    pub fn transient(operation: impl Into<String>, message: impl Into<String>) -> Self {
        VersionError::Transient {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Default retry classifier for repository I/O.
    ///
    /// libgit2 reports lock contention as `ErrorCode::Locked`; short reads and
    /// sharing violations surface through the OS, filesystem and object
    /// database classes. A missing object is never transient.
    pub fn is_transient(&self) -> bool {
        match self {
            VersionError::Transient { .. } => true,
            VersionError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::UnexpectedEof
            ),
            VersionError::Git(e) => {
                if e.code() == git2::ErrorCode::Locked {
                    return true;
                }
                e.code() != git2::ErrorCode::NotFound
                    && matches!(
                        e.class(),
                        git2::ErrorClass::Os | git2::ErrorClass::Filesystem | git2::ErrorClass::Odb
                    )
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VersionError::config("negative retry count");
        assert_eq!(err.to_string(), "Configuration error: negative retry count");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: VersionError = io_err.into();
        assert!(matches!(err, VersionError::Io(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_exhausted_display_counts_attempts() {
        let err = VersionError::RetryExhausted {
            operation: "find commit".to_string(),
            attempts: vec![
                VersionError::transient("find commit", "locked"),
                VersionError::transient("find commit", "locked"),
            ],
        };
        assert_eq!(err.to_string(), "find commit failed after 2 attempts");
    }

    #[test]
    fn test_git_lock_is_transient() {
        let err: VersionError =
            git2::Error::new(git2::ErrorCode::Locked, git2::ErrorClass::Reference, "locked").into();
        assert!(err.is_transient());
    }

    #[test]
    fn test_git_not_found_is_not_transient() {
        let err: VersionError =
            git2::Error::new(git2::ErrorCode::NotFound, git2::ErrorClass::Odb, "missing").into();
        assert!(!err.is_transient());
    }

    #[test]
    fn test_config_error_is_not_transient() {
        assert!(!VersionError::config("bad regex").is_transient());
        assert!(VersionError::transient("read tags", "short read").is_transient());
    }
}
