//! Basename glob matching for ignore rules.

use std::collections::HashSet;
use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::warn;

use repoprompt_core::{ConfigError, FilterConfig};

/// Compiled form of a [`FilterConfig`].
///
/// Only the final path component is ever matched, so `build` ignores every
/// directory named `build` at any depth and nothing else. Matching is
/// case-sensitive and supports `*`, `?`, `[...]` and `[!...]`.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    directories: GlobSet,
    files: GlobSet,
    extensions: HashSet<String>,
}

impl PatternMatcher {
    /// Compile the pattern lists of `config`.
    pub fn new(config: &FilterConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            directories: compile("directory", &config.ignore_patterns.directories)?,
            files: compile("file", &config.ignore_patterns.files)?,
            extensions: config
                .excluded_extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
        })
    }

    /// Whether a directory with this name is pruned.
    pub fn is_ignored_dir(&self, name: impl AsRef<Path>) -> bool {
        self.directories.is_match(basename(name.as_ref()))
    }

    /// Whether a file with this name is left out, by pattern or extension.
    pub fn is_ignored_file(&self, name: impl AsRef<Path>) -> bool {
        let name = basename(name.as_ref());
        if self.files.is_match(name) {
            return true;
        }
        match name.extension() {
            Some(ext) => {
                let ext = format!(".{}", ext.to_string_lossy().to_lowercase());
                self.extensions.contains(&ext)
            }
            None => false,
        }
    }

    /// Dispatch on entry type.
    pub fn is_ignored(&self, name: impl AsRef<Path>, is_dir: bool) -> bool {
        if is_dir {
            self.is_ignored_dir(name)
        } else {
            self.is_ignored_file(name)
        }
    }
}

fn basename(path: &Path) -> &Path {
    path.file_name().map(Path::new).unwrap_or(path)
}

fn compile(list: &'static str, patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = match glob_builder(pattern).build() {
            Ok(glob) => glob,
            Err(e) => {
                warn!("Invalid {list} pattern {pattern:?} ({e}), matching it literally");
                glob_builder(&escape_literal(pattern))
                    .build()
                    .map_err(|e| ConfigError::Glob {
                        list,
                        message: e.to_string(),
                    })?
            }
        };
        builder.add(glob);
    }
    builder.build().map_err(|e| ConfigError::Glob {
        list,
        message: e.to_string(),
    })
}

fn glob_builder(pattern: &str) -> GlobBuilder<'_> {
    let mut builder = GlobBuilder::new(pattern);
    builder.case_insensitive(false).backslash_escape(false);
    builder
}

/// Wrap glob metacharacters in classes so they match themselves.
fn escape_literal(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '*' | '?' | '[' | ']' | '{' | '}' => {
                escaped.push('[');
                escaped.push(c);
                escaped.push(']');
            }
            _ => escaped.push(c),
        }
    }
    escaped
}
