//! Path sanitizing, validation and joining.
//!
//! Every filesystem entry point funnels through these three functions:
//!
//! - [`sanitize`] resolves `.`, `..` and symlinks into a canonical absolute path.
//! - [`validate`] answers whether a path is safe to touch: it exists (unless
//!   allowed not to), is not a symlink, and stays inside an optional root.
//! - [`secure_join`] builds child paths and resolves the result, so a joined
//!   path that escapes its base is always visible to [`validate`].
//!
//! Resolution is lenient: the longest existing prefix is canonicalized and
//! the rest is appended lexically, so paths that do not exist yet can still
//! be sanitized and checked.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::error::PathError;

/// Resolve `path` into a canonical absolute path.
pub fn sanitize(path: impl AsRef<Path>) -> Result<PathBuf, PathError> {
    let path = path.as_ref();
    let absolute = absolute(path)?;
    resolve(&absolute)
}

/// Check whether `path` is safe to use. Never fails; problems yield `false`.
///
/// Symlinks are refused outright, even ones pointing inside `root`. With a
/// `root`, every ancestor of `path` as written is checked as well, so a path
/// reaching into the root through a link elsewhere is refused too. When
/// `allow_nonexistent` is set and `path` does not exist, containment is
/// checked on its parent.
pub fn validate(path: impl AsRef<Path>, root: Option<&Path>, allow_nonexistent: bool) -> bool {
    let root = match root.map(sanitize).transpose() {
        Ok(root) => root,
        Err(e) => {
            warn!("Error validating root: {e}");
            return false;
        }
    };
    check(path.as_ref(), root.as_deref(), allow_nonexistent)
}

/// [`validate`] against a `root` that has already been sanitized.
///
/// Skips resolving the root again, for callers checking many entries
/// under the same one.
pub fn validate_in(path: impl AsRef<Path>, root: &Path, allow_nonexistent: bool) -> bool {
    check(path.as_ref(), Some(root), allow_nonexistent)
}

fn check(raw: &Path, root: Option<&Path>, allow_nonexistent: bool) -> bool {
    let resolved = match sanitize(raw) {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!("Error validating path {}: {e}", raw.display());
            return false;
        }
    };

    let exists = resolved.exists();
    if !allow_nonexistent && !exists {
        warn!("Path does not exist: {}", resolved.display());
        return false;
    }

    if is_symlink(raw) || is_symlink(&resolved) {
        warn!("Path is a symlink (not allowed): {}", raw.display());
        return false;
    }

    let Some(root) = root else {
        return true;
    };

    if let Some(link) = symlinked_ancestor(raw, root) {
        warn!(
            "Path {} passes through a symlink (not allowed): {}",
            raw.display(),
            link.display()
        );
        return false;
    }

    let check_path = if allow_nonexistent && !exists {
        resolved.parent().unwrap_or(resolved.as_path())
    } else {
        resolved.as_path()
    };
    if !check_path.starts_with(root) {
        warn!("Path {} is outside root {}", resolved.display(), root.display());
        return false;
    }

    true
}

/// Join `parts` onto `base` and resolve the result.
///
/// Absolute parts are rejected since they would silently replace `base`.
pub fn secure_join<I, P>(base: impl AsRef<Path>, parts: I) -> Result<PathBuf, PathError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let base = base.as_ref();
    let mut joined = sanitize(base)?;
    for part in parts {
        let part = part.as_ref();
        if part.has_root() || part.is_absolute() {
            return Err(PathError::AbsoluteComponent {
                base: base.to_path_buf(),
                component: part.to_path_buf(),
            });
        }
        joined.push(part);
    }
    resolve(&joined)
}

fn absolute(path: &Path) -> Result<PathBuf, PathError> {
    if path.as_os_str().is_empty() {
        return Err(PathError::Empty);
    }
    if path.as_os_str().as_encoded_bytes().contains(&0) {
        return Err(PathError::NulByte {
            path: path.to_path_buf(),
        });
    }
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|source| PathError::Resolve {
            path: path.to_path_buf(),
            source,
        })
}

/// Canonicalize `absolute`, falling back to a component walk when part of
/// it does not exist: the existing prefix is canonicalized and the rest is
/// normalized lexically until a `..` climbs back into an existing directory.
fn resolve(absolute: &Path) -> Result<PathBuf, PathError> {
    match absolute.canonicalize() {
        Ok(canonical) => return Ok(canonical),
        Err(e) if is_missing(&e) => {}
        Err(source) => {
            return Err(PathError::Resolve {
                path: absolute.to_path_buf(),
                source,
            });
        }
    }

    let mut resolved = PathBuf::new();
    let mut exists = true;

    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
                if !exists {
                    exists = canonicalize_into(&mut resolved, absolute)?;
                }
            }
            Component::Normal(name) => {
                resolved.push(name);
                if exists {
                    exists = canonicalize_into(&mut resolved, absolute)?;
                }
            }
        }
    }

    Ok(resolved)
}

/// Replace `resolved` with its canonical form. Returns `false`, leaving it
/// untouched, when it does not exist.
fn canonicalize_into(resolved: &mut PathBuf, absolute: &Path) -> Result<bool, PathError> {
    match resolved.canonicalize() {
        Ok(canonical) => {
            *resolved = canonical;
            Ok(true)
        }
        Err(e) if is_missing(&e) => Ok(false),
        Err(source) => Err(PathError::Resolve {
            path: absolute.to_path_buf(),
            source,
        }),
    }
}

fn is_missing(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

fn is_symlink(path: &Path) -> bool {
    path.symlink_metadata()
        .is_ok_and(|m| m.file_type().is_symlink())
}

/// First symlink among the ancestors of `path`, taken component by
/// component as written so a `..` cannot hide a link it climbs out of.
/// Ancestors of the sanitized `root` are skipped.
fn symlinked_ancestor(path: &Path, root: &Path) -> Option<PathBuf> {
    let absolute = absolute(path).ok()?;

    let mut current = PathBuf::new();
    let mut components = absolute.components().peekable();
    while let Some(component) = components.next() {
        // The final component is the path itself, already checked.
        if components.peek().is_none() {
            break;
        }
        current.push(component.as_os_str());
        if root.starts_with(&current) {
            continue;
        }
        if is_symlink(&current) {
            return Some(current);
        }
    }
    None
}
