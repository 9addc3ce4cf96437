//! Order-insensitive digest of a filter configuration.
//!
//! Each list is de-duplicated and sorted before hashing, so two
//! configurations holding the same pattern sets fingerprint identically no
//! matter the insertion order. Entries are length-prefixed and sections are
//! tagged, which keeps `["a,b"]` and `["a", "b"]` apart.

use std::collections::BTreeSet;

use blake3::Hasher;
use itertools::Itertools;

use repoprompt_core::{FilterConfig, Fingerprint};

/// Compute the fingerprint of `config`.
pub fn fingerprint(config: &FilterConfig) -> Fingerprint {
    let mut hasher = Hasher::new();
    hash_section(&mut hasher, "dirs", &config.ignore_patterns.directories);
    hash_section(&mut hasher, "files", &config.ignore_patterns.files);
    hash_section(&mut hasher, "exts", &config.excluded_extensions);
    Fingerprint::new(*hasher.finalize().as_bytes())
}

/// Human-readable normalized form, `dirs:..|files:..|exts:..`, for logs.
pub fn describe(config: &FilterConfig) -> String {
    format!(
        "dirs:{}|files:{}|exts:{}",
        normalized(&config.ignore_patterns.directories).iter().join(","),
        normalized(&config.ignore_patterns.files).iter().join(","),
        normalized(&config.excluded_extensions).iter().join(","),
    )
}

fn normalized(patterns: &[String]) -> BTreeSet<&str> {
    patterns.iter().map(String::as_str).collect()
}

fn hash_section(hasher: &mut Hasher, tag: &str, patterns: &[String]) {
    let sorted = normalized(patterns);
    hasher.update(tag.as_bytes());
    hasher.update(&(sorted.len() as u64).to_le_bytes());
    for pattern in sorted {
        hasher.update(&(pattern.len() as u64).to_le_bytes());
        hasher.update(pattern.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dirs: &[&str], files: &[&str], exts: &[&str]) -> FilterConfig {
        FilterConfig::new(
            dirs.iter().copied(),
            files.iter().copied(),
            exts.iter().copied(),
        )
    }

    #[test]
    fn test_order_insensitive() {
        let a = config(&[".git", "target"], &["*.log", "*.pyc"], &[".png", ".zip"]);
        let b = config(&["target", ".git"], &["*.pyc", "*.log"], &[".zip", ".png"]);
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_duplicates_are_redundant() {
        let a = config(&["target", "target"], &[], &[]);
        let b = config(&["target"], &[], &[]);
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_different_sets_differ() {
        let base = config(&["target"], &["*.log"], &[".png"]);
        let variants = [
            config(&["target", "dist"], &["*.log"], &[".png"]),
            config(&["target"], &["*.log", "*.tmp"], &[".png"]),
            config(&["target"], &["*.log"], &[]),
            config(&[], &["*.log"], &[".png"]),
        ];
        for variant in &variants {
            assert_ne!(fingerprint(&base), fingerprint(variant));
        }
    }

    #[test]
    fn test_sections_do_not_bleed() {
        let in_dirs = config(&["vendor"], &[], &[]);
        let in_files = config(&[], &["vendor"], &[]);
        assert_ne!(fingerprint(&in_dirs), fingerprint(&in_files));

        let joined = config(&["a,b"], &[], &[]);
        let split = config(&["a", "b"], &[], &[]);
        assert_ne!(fingerprint(&joined), fingerprint(&split));
    }

    #[test]
    fn test_describe_is_sorted() {
        let c = config(&["target", ".git"], &["*.log"], &[]);
        assert_eq!(describe(&c), "dirs:.git,target|files:*.log|exts:");
    }
}
