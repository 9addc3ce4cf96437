//! Prompt assembly for repoprompt.
//!
//! Turns a crawled [`FileTree`](repoprompt_core::FileTree) into a single
//! prompt document, in XML or Markdown, and renders plain-text outlines
//! and overviews of the same tree.
//!
//! # Example
//!
//! ```rust,no_run
//! use repoprompt_ops::{FileAccess, WriteMode};
//! use repoprompt_prompt::{PromptBuilder, PromptFormat, PromptOptions};
//! use repoprompt_scan::{FilterConfig, RepositoryCrawler};
//!
//! let crawler = RepositoryCrawler::new("/path/to/repo", FilterConfig::recommended()).unwrap();
//! let tree = crawler.get_file_tree().unwrap();
//! let access = FileAccess::scoped(crawler.root_path(), WriteMode::DryRun).unwrap();
//!
//! let options = PromptOptions::builder()
//!     .format(PromptFormat::Markdown)
//!     .build()
//!     .unwrap();
//! let prompt = PromptBuilder::new(&access, options).build(&tree).unwrap();
//! println!("{}", prompt.text);
//! ```

mod builder;
mod format;
mod outline;

pub use builder::{
    IncludedFile, PathStyle, Prompt, PromptBuilder, PromptError, PromptOptions,
    PromptOptionsBuilder, SkipReason, SkippedFile, repository_name,
};
pub use format::{PromptFormat, language_for};
pub use outline::{Overview, render_outline};
