//! Write modes, write reports and file access errors.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

use repoprompt_core::PathError;

/// Whether writes touch the filesystem. Chosen once, at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum WriteMode {
    /// Validate and report, but change nothing.
    #[default]
    #[strum(to_string = "dry run")]
    DryRun,
    /// Create directories and write files.
    #[strum(to_string = "apply")]
    Apply,
}

/// Effect a write had, or would have had, on its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum WriteAction {
    /// The target did not exist.
    Created,
    /// The target existed and was replaced.
    Modified,
}

/// Outcome of a write, simulated or applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReport {
    /// Resolved target path.
    pub path: PathBuf,
    /// Whether the target is new.
    pub action: WriteAction,
    /// Content length in bytes.
    pub bytes: usize,
    /// Missing parent directories, outermost first.
    pub created_dirs: Vec<PathBuf>,
    /// False for dry runs.
    pub applied: bool,
}

/// Errors from [`FileAccess::read`](crate::FileAccess::read).
#[derive(Debug, Error)]
pub enum ReadError {
    /// Nothing exists at the path.
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    /// The path is a symlink or lies outside the root.
    #[error("Invalid or unsafe path: {path}")]
    Rejected { path: PathBuf },

    /// The path could not be resolved.
    #[error(transparent)]
    Path(#[from] PathError),

    /// Access denied by the operating system.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Content is not valid UTF-8.
    #[error("Failed to decode file {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Any other I/O failure.
    #[error("Error reading file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReadError {
    /// Classify an I/O error raised while reading `path`.
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Errors from [`FileAccess::write`](crate::FileAccess::write).
#[derive(Debug, Error)]
pub enum WriteError {
    /// The path could not be resolved.
    #[error(transparent)]
    Path(#[from] PathError),

    /// The parent directory is unsafe or outside the root.
    #[error("Invalid or unsafe parent directory: {path}")]
    RejectedParent { path: PathBuf },

    /// The target itself is unsafe or outside the root.
    #[error("Invalid or unsafe path: {path}")]
    Rejected { path: PathBuf },

    /// The target is an existing directory.
    #[error("Cannot write over directory: {path}")]
    IsDirectory { path: PathBuf },

    /// Parent directories could not be created.
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The write itself failed.
    #[error("Error writing file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_mode_defaults_to_dry_run() {
        assert_eq!(WriteMode::default(), WriteMode::DryRun);
        assert_eq!(WriteMode::DryRun.to_string(), "dry run");
        assert_eq!(WriteAction::Modified.to_string(), "modified");
    }

    #[test]
    fn test_read_error_classification() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(matches!(
            ReadError::from_io("/x", denied),
            ReadError::PermissionDenied { .. }
        ));

        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert!(matches!(
            ReadError::from_io("/x", missing),
            ReadError::NotFound { .. }
        ));

        let other = std::io::Error::other("boom");
        let err = ReadError::from_io("/x", other);
        assert!(matches!(err, ReadError::Io { .. }));
        assert!(err.to_string().contains("boom"));
    }
}
