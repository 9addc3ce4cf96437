//! Error and warning types for crawling operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A path that could not be resolved at all.
#[derive(Debug, Error)]
pub enum PathError {
    /// The empty path has no meaning as a location.
    #[error("Invalid path: path is empty")]
    Empty,

    /// Interior NUL bytes cannot be handed to the operating system.
    #[error("Invalid path: {path} contains a NUL byte")]
    NulByte { path: PathBuf },

    /// A joined component was absolute and would discard its base.
    #[error("Invalid path component {component} joined onto {base}")]
    AbsoluteComponent { base: PathBuf, component: PathBuf },

    /// Resolution failed (permissions, no working directory, ...).
    #[error("Invalid path {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Rejected filter configuration or settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The untyped input does not have the expected structure.
    #[error("Invalid configuration shape: {message}")]
    Shape { message: String },

    /// A glob pattern that can never be used.
    #[error("Invalid {list} pattern {pattern:?}: {reason}")]
    Pattern {
        list: &'static str,
        pattern: String,
        reason: &'static str,
    },

    /// The pattern list could not be compiled into a matcher.
    #[error("Failed to compile {list} patterns: {message}")]
    Glob { list: &'static str, message: String },

    /// An excluded extension without its leading dot.
    #[error("Invalid excluded extension {extension:?}: must start with '.'")]
    Extension { extension: String },

    /// A stored rule with a blank name or body.
    #[error("Invalid rule {name:?}: {reason}")]
    Rule { name: String, reason: &'static str },

    /// The settings file exists but could not be read.
    #[error("Failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for [`Settings`](crate::Settings).
    #[error("Failed to parse settings from {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors that abort a crawl.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The root is a symlink, or stopped being a safe root.
    #[error("Invalid or unsafe root path: {path}")]
    InvalidRoot { path: PathBuf },

    /// A configuration replacement was rejected.
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    /// A path could not be resolved.
    #[error(transparent)]
    Path(#[from] PathError),

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CrawlError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Kind of crawl warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Entry failed validation (symlink or outside the root).
    Rejected,
    /// Entry path could not be resolved.
    InvalidPath,
    /// Directory could not be read.
    ReadError,
    /// Size or type lookup failed.
    MetadataError,
}

/// Non-fatal problem with a single entry; the entry is left out of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl CrawlWarning {
    /// Create a new crawl warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a warning for an entry that failed validation.
    pub fn rejected(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Skipping unsafe entry: {}", path.display()),
            path,
            kind: WarningKind::Rejected,
        }
    }

    /// Create a warning for a path that failed to resolve.
    pub fn invalid_path(path: impl Into<PathBuf>, error: &PathError) -> Self {
        Self {
            path: path.into(),
            message: error.to_string(),
            kind: WarningKind::InvalidPath,
        }
    }

    /// Create a read error warning.
    pub fn read_error(path: impl Into<PathBuf>, error: &dyn std::fmt::Display) -> Self {
        Self {
            path: path.into(),
            message: format!("Read error: {error}"),
            kind: WarningKind::ReadError,
        }
    }

    /// Create a metadata (stat) error warning.
    pub fn metadata_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        Self {
            message: format!("Could not get size for {}: {error}", path.display()),
            path,
            kind: WarningKind::MetadataError,
        }
    }
}
