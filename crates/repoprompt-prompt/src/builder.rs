//! Assembles the contents of a crawled tree into a single prompt.

use std::fmt;
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::{debug, info, warn};

use repoprompt_core::{FileTree, Settings};
use repoprompt_ops::{FileAccess, ReadError};

use crate::format::{PromptFormat, Section, render};

/// How file paths are written into the prompt.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PathStyle {
    /// `<repo name>/<path under the root>`.
    #[default]
    Relative,
    /// Resolved absolute path.
    Absolute,
}

/// Options for [`PromptBuilder`].
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct PromptOptions {
    /// Output layout.
    #[builder(default)]
    #[serde(default)]
    pub format: PromptFormat,

    /// Path style for file headings.
    #[builder(default)]
    #[serde(default)]
    pub path_style: PathStyle,

    /// Files larger than this many bytes are skipped.
    #[builder(default = "DEFAULT_MAX_FILE_SIZE")]
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Named rule texts placed before the files, in order.
    #[builder(default)]
    #[serde(default)]
    pub rules: IndexMap<String, String>,
}

const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            format: PromptFormat::default(),
            path_style: PathStyle::default(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            rules: IndexMap::new(),
        }
    }
}

impl PromptOptions {
    /// Create a new options builder.
    pub fn builder() -> PromptOptionsBuilder {
        PromptOptionsBuilder::default()
    }

    /// Options seeded from stored settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            path_style: if settings.use_relative_paths {
                PathStyle::Relative
            } else {
                PathStyle::Absolute
            },
            max_file_size: settings.max_file_size,
            rules: settings.rules.clone(),
            ..Self::default()
        }
    }
}

impl PromptOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(rules) = &self.rules {
            for (name, body) in rules {
                if name.trim().is_empty() {
                    return Err("Rule name cannot be blank".to_string());
                }
                if body.trim().is_empty() {
                    return Err(format!("Rule {name:?} has no content"));
                }
            }
        }
        Ok(())
    }
}

/// Errors that prevent a prompt from being built at all.
#[derive(Debug, Error)]
pub enum PromptError {
    /// The tree root is a file.
    #[error("Tree root is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// A file in the tree does not lie under the root.
    #[error("File {path} is outside repository root {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

/// A file whose content made it into the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludedFile {
    /// Path as written in the prompt.
    pub path: String,
    /// Resolved path on disk.
    pub source: PathBuf,
    /// Content length in bytes.
    pub bytes: usize,
}

/// Why a file was left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Not valid UTF-8.
    Binary,
    /// Larger than the configured limit.
    TooLarge { size: u64, limit: u64 },
    /// Missing, refused or failing to read.
    Unreadable { message: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary => f.write_str("binary content"),
            Self::TooLarge { size, limit } => {
                write!(f, "{size} bytes exceeds the {limit} byte limit")
            }
            Self::Unreadable { message } => f.write_str(message),
        }
    }
}

/// A file left out of the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// A built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    /// The prompt text.
    pub text: String,
    /// Included files, in prompt order.
    pub files: Vec<IncludedFile>,
    /// Files left out, in tree order.
    pub skipped: Vec<SkippedFile>,
}

/// Reads every file of a tree through a [`FileAccess`] and lays the
/// contents out as one prompt.
///
/// Files are visited depth-first in tree order. Files that cannot be used
/// are recorded in [`Prompt::skipped`] and never abort the build.
#[derive(Debug)]
pub struct PromptBuilder<'a> {
    access: &'a FileAccess,
    options: PromptOptions,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(access: &'a FileAccess, options: PromptOptions) -> Self {
        Self { access, options }
    }

    pub fn options(&self) -> &PromptOptions {
        &self.options
    }

    /// Build the prompt for `tree`.
    pub fn build(&self, tree: &FileTree) -> Result<Prompt, PromptError> {
        let root = tree.root_path();
        if !tree.root.is_dir() {
            return Err(PromptError::NotADirectory {
                path: root.to_path_buf(),
            });
        }
        let name = repository_name(root);

        let mut loaded = Vec::new();
        let mut skipped = Vec::new();
        for source in tree.root.files() {
            let path = self.display_path(&name, root, source)?;
            match self.load(source) {
                Ok(content) => {
                    debug!("Including {} ({} bytes)", source.display(), content.len());
                    loaded.push((path, source.to_path_buf(), content));
                }
                Err(reason) => {
                    warn!("Skipping {}: {reason}", source.display());
                    skipped.push(SkippedFile {
                        path: source.to_path_buf(),
                        reason,
                    });
                }
            }
        }

        let sections: Vec<Section<'_>> = loaded
            .iter()
            .map(|(path, _, content)| Section { path, content })
            .collect();
        let text = render(self.options.format, &name, &self.options.rules, &sections);

        info!(
            "Built {} prompt: {} files, {} skipped, {} bytes",
            self.options.format,
            loaded.len(),
            skipped.len(),
            text.len()
        );

        let files = loaded
            .into_iter()
            .map(|(path, source, content)| IncludedFile {
                path,
                source,
                bytes: content.len(),
            })
            .collect();
        Ok(Prompt {
            text,
            files,
            skipped,
        })
    }

    fn display_path(&self, name: &str, root: &Path, source: &Path) -> Result<String, PromptError> {
        match self.options.path_style {
            PathStyle::Absolute => Ok(source.display().to_string()),
            PathStyle::Relative => {
                let relative =
                    source
                        .strip_prefix(root)
                        .map_err(|_| PromptError::OutsideRoot {
                            path: source.to_path_buf(),
                            root: root.to_path_buf(),
                        })?;
                let parts: Vec<_> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect();
                Ok(format!("{name}/{}", parts.join("/")))
            }
        }
    }

    fn load(&self, source: &Path) -> Result<String, SkipReason> {
        let size = self.access.size(source).map_err(unreadable)?;
        if size > self.options.max_file_size {
            return Err(SkipReason::TooLarge {
                size,
                limit: self.options.max_file_size,
            });
        }
        self.access.read(source).map_err(|e| match e {
            ReadError::Decode { .. } => SkipReason::Binary,
            other => unreadable(other),
        })
    }
}

fn unreadable(error: ReadError) -> SkipReason {
    SkipReason::Unreadable {
        message: error.to_string(),
    }
}

/// Final component of the root, or the whole path for `/`.
pub fn repository_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}
