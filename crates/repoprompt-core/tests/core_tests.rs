use repoprompt_core::{
    ConfigError, CrawlWarning, FilterConfig, Fingerprint, IgnorePatterns, Settings, TreeNode,
    WarningKind, sanitize, secure_join, validate,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn canonical_temp() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    (temp, root)
}

#[test]
fn test_tree_node_discrimination() {
    let file = TreeNode::new_file("/repo/main.rs");
    assert!(file.is_file());
    assert!(!file.is_dir());
    assert_eq!(file.name(), "main.rs");
    assert_eq!(file.file_count(), 1);
    assert_eq!(file.dir_count(), 0);
    assert!(file.children().is_empty());

    let dir = TreeNode::new_directory("/repo");
    assert!(dir.is_dir());
    assert!(!dir.is_file());
    assert_eq!(dir.file_count(), 0);
}

#[test]
fn test_tree_node_sorting_and_lookup() {
    let mut lib = TreeNode::new_directory("/repo/lib");
    lib.push_child(TreeNode::new_file("/repo/lib/z.rs"));
    lib.push_child(TreeNode::new_file("/repo/lib/a.rs"));

    let mut root = TreeNode::new_directory("/repo");
    root.push_child(TreeNode::new_file("/repo/README.md"));
    root.push_child(lib);
    root.push_child(TreeNode::new_file("/repo/Cargo.toml"));

    root.sort_children_by_name();

    let names: Vec<_> = root.children().iter().map(|c| c.name().into_owned()).collect();
    assert_eq!(names, vec!["Cargo.toml", "README.md", "lib"]);

    let lib = root.child("lib").unwrap();
    let names: Vec<_> = lib.children().iter().map(|c| c.name().into_owned()).collect();
    assert_eq!(names, vec!["a.rs", "z.rs"]);

    let files: Vec<_> = root.files().map(|p| p.to_path_buf()).collect();
    assert_eq!(
        files,
        vec![
            PathBuf::from("/repo/Cargo.toml"),
            PathBuf::from("/repo/README.md"),
            PathBuf::from("/repo/lib/a.rs"),
            PathBuf::from("/repo/lib/z.rs"),
        ]
    );
}

#[test]
fn test_tree_node_json_round_shape() {
    let json = serde_json::json!({
        "type": "directory",
        "path": "/repo",
        "children": [
            { "type": "file", "path": "/repo/a.txt" },
            { "type": "directory", "path": "/repo/sub", "children": [] }
        ]
    });

    let node: TreeNode = serde_json::from_value(json).unwrap();
    assert_eq!(node.child_count(), 2);
    assert!(node.child("a.txt").unwrap().is_file());
    assert!(node.child("sub").unwrap().is_dir());
}

#[test]
fn test_fingerprint_equality() {
    assert_eq!(Fingerprint::new([1; 32]), Fingerprint::new([1; 32]));
    assert_ne!(Fingerprint::new([1; 32]), Fingerprint::new([2; 32]));
}

#[test]
fn test_filter_config_new_copies_lists() {
    let dirs = vec!["target".to_string()];
    let config = FilterConfig::new(dirs.clone(), vec!["*.log".to_string()], Vec::<String>::new());

    assert_eq!(
        config.ignore_patterns,
        IgnorePatterns {
            directories: dirs,
            files: vec!["*.log".to_string()],
        }
    );
    assert!(config.validate().is_ok());
}

#[test]
fn test_filter_config_rejects_extension_without_dot() {
    let config = FilterConfig::new(Vec::<String>::new(), Vec::<String>::new(), vec!["rs".to_string()]);
    assert!(matches!(config.validate(), Err(ConfigError::Extension { .. })));
}

#[test]
fn test_settings_defaults() {
    let settings = Settings::default();
    assert!(settings.use_relative_paths);
    assert_eq!(settings.max_file_size, 1024 * 1024);
    assert!(settings.rules.is_empty());
    assert_eq!(settings.filter, FilterConfig::recommended());
}

#[test]
fn test_warning_kinds() {
    let warning = CrawlWarning::new("/x", "msg", WarningKind::ReadError);
    assert_eq!(warning.kind, WarningKind::ReadError);
    assert_eq!(warning.path, PathBuf::from("/x"));
}

#[test]
fn test_sanitize_is_absolute() {
    let sanitized = sanitize(".").unwrap();
    assert!(sanitized.is_absolute());
}

#[test]
fn test_secure_join_then_validate_escape() {
    let (_temp, root) = canonical_temp();
    let inner = root.join("repo");
    fs::create_dir(&inner).unwrap();
    fs::write(root.join("secret.txt"), "secret").unwrap();

    let joined = secure_join(&inner, ["..", "secret.txt"]).unwrap();
    assert_eq!(joined, root.join("secret.txt"));
    assert!(!validate(&joined, Some(&inner), false));
}

#[cfg(unix)]
#[test]
fn test_symlink_pointing_inside_root_is_rejected() {
    let (_temp, root) = canonical_temp();
    fs::create_dir(root.join("dir")).unwrap();
    std::os::unix::fs::symlink(root.join("dir"), root.join("dir_link")).unwrap();

    assert!(validate(root.join("dir"), Some(&root), false));
    assert!(!validate(root.join("dir_link"), Some(&root), false));
}

#[cfg(unix)]
#[test]
fn test_broken_symlink_is_rejected_even_when_nonexistent_allowed() {
    let (_temp, root) = canonical_temp();
    std::os::unix::fs::symlink(root.join("nowhere"), root.join("broken")).unwrap();

    assert!(!validate(root.join("broken"), Some(&root), true));
}
