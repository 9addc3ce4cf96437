//! Core types and primitives for repoprompt.
//!
//! This crate provides the data structures shared by the crawler, the file
//! access layer and prompt assembly: filter configuration and settings,
//! tree nodes, crawl results, errors, and the path security primitives that
//! every filesystem access goes through.

mod config;
mod error;
mod node;
pub mod paths;
mod tree;

pub use config::{FilterConfig, FilterConfigBuilder, IgnorePatterns, Settings};
pub use error::{ConfigError, CrawlError, CrawlWarning, PathError, WarningKind};
pub use node::{Iter, TreeNode};
pub use paths::{sanitize, secure_join, validate, validate_in};
pub use tree::{FileListing, FileRecord, FileTree, Fingerprint, TreeStats};
