use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while sorting a folder or undoing a sort.
#[derive(Debug, Error)]
pub enum SortError {
    /// The target folder is missing or is not a directory.
    #[error("Invalid target folder {}: {reason}", .path.display())]
    InvalidTarget { path: PathBuf, reason: String },

    /// A single file could not be moved. The pass continues.
    #[error("Failed to move {} to {}: {error}", .original.display(), .destination.display())]
    MoveFailed {
        original: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// A recorded move could not be reversed without losing data.
    #[error("Cannot restore {} to {}: {reason}", .destination.display(), .original.display())]
    UndoConflict {
        original: PathBuf,
        destination: PathBuf,
        reason: String,
    },

    /// The session journal could not be read or written.
    #[error("Session journal {}: {reason}", .path.display())]
    Journal { path: PathBuf, reason: String },

    /// The sort log could not be written.
    #[error("Failed to write sort log {}: {error}", .path.display())]
    Log {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

impl SortError {
    pub(crate) fn invalid_target(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for sort and undo operations.
pub type SortResult<T> = Result<T, SortError>;
