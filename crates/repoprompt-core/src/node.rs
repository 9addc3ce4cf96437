//! Tree node types.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A directory or file in a crawled tree.
///
/// `path` is always resolved and absolute. Serialized with a `type` tag of
/// `"directory"` or `"file"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    /// Directory with its direct children, sorted by name.
    Directory {
        path: PathBuf,
        children: Vec<TreeNode>,
    },
    /// Regular file.
    File { path: PathBuf },
}

impl TreeNode {
    /// Create an empty directory node.
    pub fn new_directory(path: impl Into<PathBuf>) -> Self {
        Self::Directory {
            path: path.into(),
            children: Vec::new(),
        }
    }

    /// Create a file node.
    pub fn new_file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    /// The node's absolute path.
    pub fn path(&self) -> &Path {
        match self {
            Self::Directory { path, .. } | Self::File { path } => path,
        }
    }

    /// Final path component, or the whole path for a filesystem root.
    pub fn name(&self) -> Cow<'_, str> {
        let path = self.path();
        match path.file_name() {
            Some(name) => name.to_string_lossy(),
            None => path.to_string_lossy(),
        }
    }

    /// Check if this node is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory { .. })
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }

    /// Direct children; empty for files.
    pub fn children(&self) -> &[TreeNode] {
        match self {
            Self::Directory { children, .. } => children,
            Self::File { .. } => &[],
        }
    }

    /// Get the number of direct children.
    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    /// Attach a child. Files cannot have children; the child is dropped.
    pub fn push_child(&mut self, child: TreeNode) {
        if let Self::Directory { children, .. } = self {
            children.push(child);
        }
    }

    /// Find a direct child by name.
    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        self.children().iter().find(|c| c.name() == name)
    }

    /// Total files in this subtree, 1 for a file.
    pub fn file_count(&self) -> u64 {
        match self {
            Self::File { .. } => 1,
            Self::Directory { children, .. } => children.iter().map(Self::file_count).sum(),
        }
    }

    /// Total directories below this node, not counting itself.
    pub fn dir_count(&self) -> u64 {
        self.children()
            .iter()
            .filter(|c| c.is_dir())
            .map(|c| c.dir_count() + 1)
            .sum()
    }

    /// Sort children by name at every level.
    pub fn sort_children_by_name(&mut self) {
        if let Self::Directory { children, .. } = self {
            children.sort_by(|a, b| a.path().file_name().cmp(&b.path().file_name()));
            for child in children.iter_mut() {
                child.sort_children_by_name();
            }
        }
    }

    /// Depth-first, pre-order iterator over this node and its descendants.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Paths of every file in the subtree, in tree order.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.iter().filter(|n| n.is_file()).map(TreeNode::path)
    }
}

/// Pre-order iterator returned by [`TreeNode::iter`].
#[derive(Debug)]
pub struct Iter<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}
