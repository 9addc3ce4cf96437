//! Repository crawling engine for repoprompt.
//!
//! # Overview
//!
//! `repoprompt-scan` walks a repository root and produces either a nested
//! [`FileTree`] or a flat [`FileListing`]. Key features:
//!
//! - **Ignore rules** matched against basenames, with ignored directories
//!   pruned before they are read
//! - **Path validation** of every retained entry against the root
//! - **Caching** of the tree, keyed by a fingerprint of the filter
//!   configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use repoprompt_scan::{FilterConfig, RepositoryCrawler};
//!
//! let crawler = RepositoryCrawler::new("/path/to/repo", FilterConfig::recommended()).unwrap();
//! let tree = crawler.get_file_tree().unwrap();
//!
//! println!("Total files: {}", tree.total_files());
//! for record in crawler.walk().unwrap().records {
//!     println!("{} ({} bytes)", record.path.display(), record.size);
//! }
//! ```

mod crawler;
mod fingerprint;
mod matcher;

pub use crawler::RepositoryCrawler;
pub use fingerprint::{describe, fingerprint};
pub use matcher::PatternMatcher;

// Re-export core types for convenience
pub use repoprompt_core::{
    CrawlError, CrawlWarning, FileListing, FileRecord, FileTree, FilterConfig, Fingerprint,
    TreeNode, TreeStats, WarningKind,
};
