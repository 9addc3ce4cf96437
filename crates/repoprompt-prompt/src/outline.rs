//! Plain-text views of a crawled tree.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use repoprompt_core::{FileTree, TreeNode};
use repoprompt_ops::FileAccess;

use crate::builder::repository_name;

/// Render `root` as an ASCII tree, root first by name.
///
/// ```text
/// repo
/// ├── src
/// │   └── main.rs
/// └── README.md
/// ```
pub fn render_outline(root: &TreeNode) -> String {
    let mut out = repository_name(root.path());
    out.push('\n');
    render_children(root, "", &mut out);
    out
}

fn render_children(node: &TreeNode, prefix: &str, out: &mut String) {
    let children = node.children();
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        out.push_str(prefix);
        out.push_str(if last { "└── " } else { "├── " });
        out.push_str(&child.name());
        out.push('\n');

        if child.is_dir() {
            let extension = if last { "    " } else { "│   " };
            render_children(child, &format!("{prefix}{extension}"), out);
        }
    }
}

/// Summary of a crawled repository: every file with its size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overview {
    pub root: PathBuf,
    pub files: Vec<(PathBuf, u64)>,
}

impl Overview {
    /// Collect sizes for the files of `tree`. Files whose size cannot be
    /// read through `access` are left out.
    pub fn collect(tree: &FileTree, access: &FileAccess) -> Self {
        let files = tree
            .root
            .files()
            .filter_map(|path| match access.size(path) {
                Ok(size) => Some((path.to_path_buf(), size)),
                Err(e) => {
                    warn!("Leaving {} out of overview: {e}", path.display());
                    None
                }
            })
            .collect();
        Self {
            root: tree.root_path().to_path_buf(),
            files,
        }
    }

    pub fn total_files(&self) -> usize {
        self.files.len()
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|(_, size)| size).sum()
    }
}

impl fmt::Display for Overview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Repository Path: {}", self.root.display())?;
        writeln!(f, "Total Files: {}", self.total_files())?;
        for (path, size) in &self.files {
            writeln!(f)?;
            writeln!(f, "File: {}", path.display())?;
            writeln!(f, "Size: {size} bytes")?;
        }
        Ok(())
    }
}
