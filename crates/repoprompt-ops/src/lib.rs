//! File access layer for repoprompt.
//!
//! Reads are validated against an optional root before touching the
//! filesystem. Writes are gated by a [`WriteMode`] fixed at construction:
//! the default, [`WriteMode::DryRun`], validates and logs what would happen
//! without changing anything.
//!
//! # Example
//!
//! ```rust,no_run
//! use repoprompt_ops::{FileAccess, WriteMode};
//!
//! let access = FileAccess::scoped("/path/to/repo", WriteMode::DryRun).unwrap();
//! let text = access.read("/path/to/repo/README.md").unwrap();
//!
//! let report = access.write("/path/to/repo/out/prompt.xml", &text).unwrap();
//! assert!(!report.applied);
//! ```

mod access;
mod operation;

pub use access::FileAccess;
pub use operation::{ReadError, WriteAction, WriteError, WriteMode, WriteReport};
