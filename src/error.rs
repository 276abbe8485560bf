//! Error types shared by the storage layer, the engines and the command handlers.

/// Errors surfaced by task, account and storage operations.
///
/// Ownership misses (a task id that does not exist or belongs to someone else)
/// are deliberately absent: owner-scoped writes report zero affected records
/// instead of failing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A task field failed validation (empty title, bad date, bad impact).
    #[error("invalid task: {0}")]
    InvalidTask(String),

    /// Registration attempted with an id that is already taken.
    #[error("user '{0}' already exists")]
    UserExists(String),

    /// Unknown user or wrong password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// A task command was run without a session.
    #[error("not logged in; run `prio login <user>` first")]
    NotLoggedIn,

    /// Storage could not be read or written.
    #[error("persistence failure: {0}")]
    Persistence(#[from] std::io::Error),

    /// A stored document could not be decoded or encoded.
    #[error("corrupt data: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// The configuration file is unreadable or out of range.
    #[error("configuration error: {0}")]
    Config(String),

    /// Password hashing or hash parsing failed.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_become_persistence_failures() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Persistence(_)));
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn display_invalid_task() {
        let err = Error::InvalidTask("title must not be empty".into());
        assert_eq!(err.to_string(), "invalid task: title must not be empty");
    }
}
