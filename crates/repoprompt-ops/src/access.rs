//! Validated reads and mode-gated writes.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use repoprompt_core::{PathError, paths};

use crate::operation::{ReadError, WriteAction, WriteError, WriteMode, WriteReport};

/// File reader and writer, optionally confined to a root directory.
///
/// Every path is validated before use: symlinks are refused and, with a
/// root, so is anything resolving outside it. Writes only reach the disk
/// when the access was built with [`WriteMode::Apply`]; in the default
/// [`WriteMode::DryRun`] they are validated and logged, nothing more.
#[derive(Debug, Clone, Default)]
pub struct FileAccess {
    root: Option<PathBuf>,
    mode: WriteMode,
}

impl FileAccess {
    /// Unconfined access.
    pub fn new(mode: WriteMode) -> Self {
        Self { root: None, mode }
    }

    /// Access confined to `root`.
    pub fn scoped(root: impl AsRef<Path>, mode: WriteMode) -> Result<Self, PathError> {
        Ok(Self {
            root: Some(paths::sanitize(root)?),
            mode,
        })
    }

    /// The confining root, if any.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    /// Read a UTF-8 text file.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<String, ReadError> {
        let path = self.checked_source(path.as_ref())?;

        debug!("Reading file: {}", path.display());
        let bytes = fs::read(&path).map_err(|e| {
            error!("Error reading file {}: {e}", path.display());
            ReadError::from_io(&path, e)
        })?;
        let content = String::from_utf8(bytes).map_err(|source| {
            error!("Failed to decode file: {}", path.display());
            ReadError::Decode {
                path: path.clone(),
                source,
            }
        })?;

        debug!("Successfully read {} bytes from {}", content.len(), path.display());
        Ok(content)
    }

    /// Size in bytes of a file, under the same checks as [`read`](Self::read).
    pub fn size(&self, path: impl AsRef<Path>) -> Result<u64, ReadError> {
        let path = self.checked_source(path.as_ref())?;
        fs::metadata(&path)
            .map(|metadata| metadata.len())
            .map_err(|e| ReadError::from_io(&path, e))
    }

    /// Write `content` to `path`, or simulate doing so in dry-run mode.
    ///
    /// Both modes run the same validation and report whether the target
    /// is created or modified.
    pub fn write(&self, path: impl AsRef<Path>, content: &str) -> Result<WriteReport, WriteError> {
        let raw = path.as_ref();
        let path = paths::sanitize(raw)?;
        let parent = path.parent().unwrap_or(path.as_path()).to_path_buf();

        if self.root.is_some() && !paths::validate(&parent, self.root(), true) {
            error!("Invalid or unsafe parent directory: {}", parent.display());
            return Err(WriteError::RejectedParent { path: parent });
        }
        self.check_target(raw, &path)?;
        if path.is_dir() {
            error!("Cannot write over directory: {}", path.display());
            return Err(WriteError::IsDirectory { path });
        }

        let action = if path.exists() {
            WriteAction::Modified
        } else {
            WriteAction::Created
        };
        let created_dirs = missing_ancestors(&parent);

        let mut report = WriteReport {
            path,
            action,
            bytes: content.len(),
            created_dirs,
            applied: false,
        };

        match self.mode {
            WriteMode::DryRun => {
                info!(
                    "SIMULATION: Read-only: File would have been {}: {}",
                    report.action,
                    report.path.display()
                );
                if !report.created_dirs.is_empty() {
                    info!(
                        "SIMULATION: Read-only: Directory structure would have been created: {}",
                        parent.display()
                    );
                }
                info!(
                    "SIMULATION: Read-only: Would have written {} bytes to {}",
                    report.bytes,
                    report.path.display()
                );
            }
            WriteMode::Apply => {
                if !report.created_dirs.is_empty() {
                    info!("Creating directory structure: {}", parent.display());
                    fs::create_dir_all(&parent).map_err(|source| {
                        error!("Failed to create {}: {source}", parent.display());
                        WriteError::CreateDir {
                            path: parent.clone(),
                            source,
                        }
                    })?;
                }

                // Directory creation may have raced with a symlink swap.
                self.check_target(raw, &report.path)?;

                info!(
                    "Writing {} bytes to file: {}",
                    report.bytes,
                    report.path.display()
                );
                fs::write(&report.path, content).map_err(|source| {
                    error!("Error writing file {}: {source}", report.path.display());
                    WriteError::Io {
                        path: report.path.clone(),
                        source,
                    }
                })?;
                report.applied = true;
                info!(
                    "Successfully {} file: {}",
                    report.action,
                    report.path.display()
                );
            }
        }

        Ok(report)
    }

    /// Resolve a read source. Containment is checked before existence so a
    /// scoped access never reveals what exists outside its root.
    fn checked_source(&self, raw: &Path) -> Result<PathBuf, ReadError> {
        let path = paths::sanitize(raw)?;
        if !paths::validate(raw, self.root(), true) {
            error!("Invalid or unsafe path: {}", raw.display());
            return Err(ReadError::Rejected {
                path: raw.to_path_buf(),
            });
        }
        if let Err(e) = fs::symlink_metadata(raw) {
            if e.kind() == ErrorKind::NotFound {
                warn!("File not found: {}", raw.display());
                return Err(ReadError::NotFound {
                    path: raw.to_path_buf(),
                });
            }
        }
        Ok(path)
    }

    fn check_target(&self, raw: &Path, path: &Path) -> Result<(), WriteError> {
        if paths::validate(raw, self.root(), true) {
            Ok(())
        } else {
            error!("Path validation failed: {}", path.display());
            Err(WriteError::Rejected {
                path: path.to_path_buf(),
            })
        }
    }
}

/// Directories between the nearest existing ancestor and `dir`, outermost first.
fn missing_ancestors(dir: &Path) -> Vec<PathBuf> {
    let mut missing: Vec<PathBuf> = dir
        .ancestors()
        .take_while(|ancestor| !ancestor.exists())
        .map(Path::to_path_buf)
        .collect();
    missing.reverse();
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_ancestors() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().canonicalize().unwrap();

        assert!(missing_ancestors(&base).is_empty());
        assert_eq!(
            missing_ancestors(&base.join("a/b")),
            vec![base.join("a"), base.join("a/b")]
        );
    }

    #[test]
    fn test_default_is_unconfined_dry_run() {
        let access = FileAccess::default();
        assert!(access.root().is_none());
        assert_eq!(access.mode(), WriteMode::DryRun);
    }
}
