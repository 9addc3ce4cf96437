//! Crawl results: the tree container, flat listings and the config fingerprint.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::error::CrawlWarning;
use crate::node::TreeNode;

/// BLAKE3 digest of a normalized filter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Create a new fingerprint from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the fingerprint as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Summary statistics for a crawled tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    /// Total number of files.
    pub total_files: u64,
    /// Total number of directories below the root.
    pub total_dirs: u64,
    /// Maximum depth reached (root children are depth 1).
    pub max_depth: u32,
}

impl TreeStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a retained file.
    pub fn record_file(&mut self, depth: u32) {
        self.total_files += 1;
        self.max_depth = self.max_depth.max(depth);
    }

    /// Record a retained directory.
    pub fn record_dir(&mut self, depth: u32) {
        self.total_dirs += 1;
        self.max_depth = self.max_depth.max(depth);
    }
}

/// Crawled tree with the configuration fingerprint it was built under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTree {
    /// Root node; its path is the crawler root.
    pub root: TreeNode,

    /// Fingerprint of the filter the tree was built with.
    pub fingerprint: Fingerprint,

    /// When this crawl was performed.
    pub crawled_at: SystemTime,

    /// Duration of the crawl.
    pub crawl_duration: Duration,

    /// Summary statistics.
    pub stats: TreeStats,

    /// Entries left out because of per-entry problems.
    pub warnings: Vec<CrawlWarning>,
}

impl FileTree {
    /// Create a new file tree.
    pub fn new(
        root: TreeNode,
        fingerprint: Fingerprint,
        stats: TreeStats,
        crawl_duration: Duration,
        warnings: Vec<CrawlWarning>,
    ) -> Self {
        Self {
            root,
            fingerprint,
            crawled_at: SystemTime::now(),
            crawl_duration,
            stats,
            warnings,
        }
    }

    /// Root path that was crawled.
    pub fn root_path(&self) -> &std::path::Path {
        self.root.path()
    }

    /// Get the total number of files.
    pub fn total_files(&self) -> u64 {
        self.stats.total_files
    }

    /// Get the total number of directories.
    pub fn total_dirs(&self) -> u64 {
        self.stats.total_dirs
    }

    /// Check if there were any warnings during the crawl.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A file and its size in bytes, from a flat walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Resolved absolute path.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

impl FileRecord {
    /// Create a new record.
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }
}

/// Result of a flat walk. Not cached.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileListing {
    /// Retained files, ordered by path.
    pub records: Vec<FileRecord>,
    /// Entries left out because of per-entry problems.
    pub warnings: Vec<CrawlWarning>,
}

impl FileListing {
    /// Sum of all record sizes.
    pub fn total_size(&self) -> u64 {
        self.records.iter().map(|r| r.size).sum()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the walk retained nothing.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
