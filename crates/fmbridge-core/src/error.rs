//! Error types for filesystem facade operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout fmbridge.
pub type Result<T> = std::result::Result<T, FsError>;

/// Errors that can occur while operating on the filesystem.
#[derive(Debug, Error)]
pub enum FsError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// The target of a copy or move already exists.
    #[error("Already exists: {path}")]
    AlreadyExists { path: PathBuf },

    /// A directory was required.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Source and destination overlap: the same entry, a directory into its
    /// own subtree, or an entry onto a directory that contains it.
    #[error("Cannot copy {path} into or over itself ({destination})")]
    SourceIsAncestor { path: PathBuf, destination: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Moving an entry to the platform trash failed.
    #[error("Failed to trash {path}: {message}")]
    Trash { path: PathBuf, message: String },

    /// A transfer was requested with no source path set.
    #[error("No source path set")]
    NoSource,

    /// The operation was cancelled before it finished.
    #[error("Operation cancelled")]
    Cancelled,

    /// The background worker running the operation died.
    #[error("Task failed: {message}")]
    TaskFailed { message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl FsError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::AlreadyExists => Self::AlreadyExists { path },
            _ => Self::Io { path, source },
        }
    }

    /// Path the error refers to, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::PermissionDenied { path }
            | Self::NotFound { path }
            | Self::AlreadyExists { path }
            | Self::NotADirectory { path }
            | Self::Io { path, .. }
            | Self::Trash { path, .. }
            | Self::SourceIsAncestor { path, .. } => Some(path.as_path()),
            Self::NoSource
            | Self::Cancelled
            | Self::TaskFailed { .. }
            | Self::InvalidConfig { .. } => None,
        }
    }

    /// Whether this error is the result of a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
