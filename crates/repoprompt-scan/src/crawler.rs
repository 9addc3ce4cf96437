//! JWalk-based repository crawler with a configuration-keyed tree cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use jwalk::{Parallelism, WalkDir};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use repoprompt_core::{
    CrawlError, CrawlWarning, FileListing, FileRecord, FileTree, FilterConfig, Fingerprint,
    TreeNode, TreeStats, paths,
};

use crate::fingerprint::{describe, fingerprint};
use crate::matcher::PatternMatcher;

/// Crawls one repository root and caches the resulting tree.
///
/// Configuration and cache share one lock, so a configuration swap can never
/// interleave with a walk still using the previous filters.
pub struct RepositoryCrawler {
    root_path: PathBuf,
    state: Mutex<CrawlerState>,
    walks: AtomicU64,
}

struct CrawlerState {
    config: FilterConfig,
    matcher: Arc<PatternMatcher>,
    cache: Option<Arc<FileTree>>,
}

impl RepositoryCrawler {
    /// Create a crawler over `root`. The root may not exist yet.
    ///
    /// Fails with [`CrawlError::InvalidRoot`] if `root` is a symlink, and
    /// with [`CrawlError::InvalidConfig`] if `config` is rejected.
    pub fn new(root: impl AsRef<Path>, config: FilterConfig) -> Result<Self, CrawlError> {
        let supplied = root.as_ref();
        let root_path = paths::sanitize(supplied)?;
        if !paths::validate(supplied, None, true) || !paths::validate(&root_path, None, true) {
            error!("Invalid or unsafe root path: {}", supplied.display());
            return Err(CrawlError::InvalidRoot {
                path: supplied.to_path_buf(),
            });
        }

        config.validate()?;
        let matcher = PatternMatcher::new(&config)?;

        info!("Starting repository crawler at {}", root_path.display());
        debug!("Config: {}", describe(&config));

        Ok(Self {
            root_path,
            state: Mutex::new(CrawlerState {
                config,
                matcher: Arc::new(matcher),
                cache: None,
            }),
            walks: AtomicU64::new(0),
        })
    }

    /// Sanitized root every produced path lies under.
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Copy of the current configuration.
    pub fn config(&self) -> FilterConfig {
        self.state.lock().config.clone()
    }

    /// Fingerprint of the current configuration.
    pub fn fingerprint(&self) -> Fingerprint {
        fingerprint(&self.state.lock().config)
    }

    /// Number of filesystem walks performed so far, tree and flat.
    pub fn walk_count(&self) -> u64 {
        self.walks.load(Ordering::Relaxed)
    }

    /// Whether a tree for the current configuration is cached.
    pub fn is_cached(&self) -> bool {
        let state = self.state.lock();
        state
            .cache
            .as_ref()
            .is_some_and(|tree| tree.fingerprint == fingerprint(&state.config))
    }

    /// Drop the cached tree.
    pub fn clear_cache(&self) {
        self.state.lock().cache = None;
    }

    /// Replace the configuration wholesale and invalidate the cache.
    ///
    /// A rejected configuration leaves the crawler untouched.
    pub fn update_configuration(&self, new_config: FilterConfig) -> Result<(), CrawlError> {
        let matcher = match new_config
            .validate()
            .and_then(|()| PatternMatcher::new(&new_config))
        {
            Ok(matcher) => matcher,
            Err(e) => {
                error!("Rejected configuration update: {e}");
                return Err(e.into());
            }
        };

        let mut state = self.state.lock();
        debug!("New config: {}", describe(&new_config));
        state.config = new_config;
        state.matcher = Arc::new(matcher);
        state.cache = None;
        info!("Configuration updated successfully");
        Ok(())
    }

    /// Like [`update_configuration`](Self::update_configuration), from an
    /// untyped mapping whose shape is checked first.
    pub fn update_configuration_from_value(
        &self,
        value: serde_json::Value,
    ) -> Result<(), CrawlError> {
        let config = FilterConfig::from_value(value).inspect_err(|e| {
            error!("Rejected configuration update: {e}");
        })?;
        self.update_configuration(config)
    }

    /// Get the tree for the current configuration, walking only on a cache miss.
    pub fn get_file_tree(&self) -> Result<Arc<FileTree>, CrawlError> {
        let mut state = self.state.lock();
        let current = fingerprint(&state.config);

        if let Some(cached) = &state.cache {
            if cached.fingerprint == current {
                debug!("Returning cached tree ({current})");
                return Ok(Arc::clone(cached));
            }
        }

        let tree = Arc::new(self.build_tree(&state.matcher, current)?);
        state.cache = Some(Arc::clone(&tree));
        Ok(tree)
    }

    /// Flat list of retained files with their sizes. Never cached.
    pub fn walk(&self) -> Result<FileListing, CrawlError> {
        info!("Walking repository for file information");
        let matcher = Arc::clone(&self.state.lock().matcher);
        self.check_root()?;
        self.walks.fetch_add(1, Ordering::Relaxed);

        let mut listing = FileListing::default();
        if !self.root_path.is_dir() {
            return Ok(listing);
        }

        for entry_result in self.walker(matcher) {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    warn!("Could not read {}: {err}", path.display());
                    listing.warnings.push(CrawlWarning::read_error(path, &err));
                    continue;
                }
            };
            if entry.depth() == 0 || entry.file_type().is_dir() {
                continue;
            }

            let Some(path) = self.admit(&entry, false, &mut listing.warnings) else {
                continue;
            };
            match std::fs::metadata(&path) {
                Ok(metadata) if metadata.is_file() => {
                    listing.records.push(FileRecord::new(path, metadata.len()));
                }
                Ok(_) => debug!("Skipping non-regular file: {}", path.display()),
                Err(e) => {
                    warn!("Could not get size for {}: {e}", path.display());
                    listing.warnings.push(CrawlWarning::metadata_error(&path, &e));
                }
            }
        }

        listing.records.sort_by(|a, b| a.path.cmp(&b.path));
        info!(
            "Walk finished: {} files, {} bytes, {} skipped",
            listing.len(),
            listing.total_size(),
            listing.warnings.len()
        );
        Ok(listing)
    }

    /// Re-check the root; it may have been replaced since construction.
    fn check_root(&self) -> Result<(), CrawlError> {
        if paths::validate(&self.root_path, None, true) {
            Ok(())
        } else {
            error!("Invalid or unsafe root path: {}", self.root_path.display());
            Err(CrawlError::InvalidRoot {
                path: self.root_path.clone(),
            })
        }
    }

    /// Serial, name-sorted walk that drops ignored entries before they are
    /// yielded, so ignored directories are never read.
    fn walker(&self, matcher: Arc<PatternMatcher>) -> WalkDir {
        WalkDir::new(&self.root_path)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true)
            .process_read_dir(move |depth, _path, _state, children| {
                // The root itself arrives with no depth and is never filtered.
                if depth.is_none() {
                    return;
                }
                children.retain(|entry_result| match entry_result {
                    Ok(entry) => !matcher.is_ignored(entry.file_name(), entry.file_type().is_dir()),
                    Err(_) => true,
                });
            })
    }

    /// Validate an entry against the root and resolve it.
    fn admit(
        &self,
        entry: &jwalk::DirEntry<((), ())>,
        allow_nonexistent: bool,
        warnings: &mut Vec<CrawlWarning>,
    ) -> Option<PathBuf> {
        let raw = entry.path();
        if !paths::validate_in(&raw, &self.root_path, allow_nonexistent) {
            warnings.push(CrawlWarning::rejected(&raw));
            return None;
        }
        match paths::secure_join(entry.parent_path(), [entry.file_name()]) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Could not resolve {}: {e}", raw.display());
                warnings.push(CrawlWarning::invalid_path(&raw, &e));
                None
            }
        }
    }

    fn build_tree(
        &self,
        matcher: &Arc<PatternMatcher>,
        fingerprint: Fingerprint,
    ) -> Result<FileTree, CrawlError> {
        let start = Instant::now();
        self.check_root()?;
        self.walks.fetch_add(1, Ordering::Relaxed);

        let mut stats = TreeStats::new();
        let mut warnings = Vec::new();

        let root = if self.root_path.is_dir() {
            let mut entries = self.collect_entries(matcher, &mut stats, &mut warnings);
            let mut root = build_node(&self.root_path, &self.root_path, &mut entries);
            root.sort_children_by_name();
            root
        } else {
            debug!("Root {} is not a directory yet", self.root_path.display());
            TreeNode::new_directory(&self.root_path)
        };

        info!(
            "Crawl finished: {} files, {} directories, {} skipped",
            stats.total_files,
            stats.total_dirs,
            warnings.len()
        );
        Ok(FileTree::new(
            root,
            fingerprint,
            stats,
            start.elapsed(),
            warnings,
        ))
    }

    /// Collect retained entries keyed by their parent directory.
    fn collect_entries(
        &self,
        matcher: &Arc<PatternMatcher>,
        stats: &mut TreeStats,
        warnings: &mut Vec<CrawlWarning>,
    ) -> HashMap<PathBuf, Vec<EntryInfo>> {
        let mut entries_by_parent: HashMap<PathBuf, Vec<EntryInfo>> = HashMap::new();

        for entry_result in self.walker(Arc::clone(matcher)) {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    warn!("Could not read {}: {err}", path.display());
                    warnings.push(CrawlWarning::read_error(path, &err));
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }
            debug!("Processing entry: {}", entry.path().display());

            let Some(path) = self.admit(&entry, true, warnings) else {
                continue;
            };

            let file_type = entry.file_type();
            let depth = entry.depth() as u32;
            let is_dir = if file_type.is_dir() {
                stats.record_dir(depth);
                true
            } else if file_type.is_file() {
                stats.record_file(depth);
                false
            } else {
                debug!("Skipping special file: {}", path.display());
                continue;
            };

            entries_by_parent
                .entry(entry.parent_path().to_path_buf())
                .or_default()
                .push(EntryInfo {
                    raw: entry.path(),
                    path,
                    is_dir,
                });
        }

        entries_by_parent
    }
}

/// Temporary struct for collecting entry information.
struct EntryInfo {
    /// Path as walked; the key for this entry's own children.
    raw: PathBuf,
    /// Resolved path stored in the node.
    path: PathBuf,
    is_dir: bool,
}

/// Recursively build a directory node from the collected entries.
fn build_node(
    raw: &Path,
    path: &Path,
    entries_by_parent: &mut HashMap<PathBuf, Vec<EntryInfo>>,
) -> TreeNode {
    let mut node = TreeNode::new_directory(path);

    for entry in entries_by_parent.remove(raw).unwrap_or_default() {
        let child = if entry.is_dir {
            build_node(&entry.raw, &entry.path, entries_by_parent)
        } else {
            TreeNode::new_file(entry.path)
        };
        node.push_child(child);
    }

    node
}
