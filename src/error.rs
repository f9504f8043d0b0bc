//! Error types for recsync.
//!
//! Uses thiserror for derive macros. Every failure of the synchronization
//! layer surfaces as one of these variants; nothing is retried past its
//! configured budget and nothing is swallowed.

use crate::exit_codes;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for recsync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The record does not exist (read-only open of an absent path).
    #[error("record not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The record or its lock could not be accessed. Never retried.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The lock was not obtained within the configured wait.
    #[error("timed out waiting for lock: {0}")]
    LockTimeout(String),

    /// Persisted state did not match the expected cache after the retry budget.
    #[error("record verification failed: {0}")]
    Conflict(String),

    /// The persisted bytes could not be decoded by the schema.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// A lock or descriptor was used in a state that does not allow it.
    #[error("invalid lock state: {0}")]
    InvalidState(String),

    /// Any other filesystem failure.
    #[error("I/O error: {0}")]
    Io(String),

    /// User provided invalid arguments or configuration.
    #[error("{0}")]
    UserError(String),
}

impl SyncError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            SyncError::UserError(_) => exit_codes::USER_ERROR,
            SyncError::NotFound(_) => exit_codes::NOT_FOUND,
            SyncError::Conflict(_) | SyncError::Corrupt(_) => exit_codes::RECORD_FAILURE,
            SyncError::LockTimeout(_) | SyncError::InvalidState(_) => exit_codes::LOCK_FAILURE,
            SyncError::PermissionDenied(_) | SyncError::Io(_) => exit_codes::IO_FAILURE,
        }
    }

    /// Classify an I/O error that occurred while working on `path`.
    ///
    /// `NotFound` and `PermissionDenied` keep their own variants so callers
    /// can react to them; everything else becomes `Io` with `action` as context.
    pub fn from_io(err: io::Error, action: &str, path: &Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => SyncError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => SyncError::PermissionDenied(format!(
                "failed to {} '{}': {}",
                action,
                path.display(),
                err
            )),
            _ => SyncError::Io(format!("failed to {} '{}': {}", action, path.display(), err)),
        }
    }
}

/// Result type alias for recsync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
