use indexmap::IndexMap;
use repoprompt_core::{FileTree, Fingerprint, TreeNode, TreeStats};
use repoprompt_ops::{FileAccess, WriteMode};
use repoprompt_prompt::{
    Overview, PathStyle, PromptBuilder, PromptError, PromptFormat, PromptOptions, SkipReason,
    render_outline,
};
use repoprompt_scan::{FilterConfig, RepositoryCrawler};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// `<tmp>/demo` with two text files, a binary file and a large file.
fn sample_repo() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap().join("demo");
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("README.md"), "# Demo\n").unwrap();
    fs::write(root.join("src/app.py"), "print('hi')\n").unwrap();
    fs::write(root.join("logo.bin"), [0xff, 0xd8, 0xff, 0x00]).unwrap();
    fs::write(root.join("big.txt"), "x".repeat(64)).unwrap();
    (temp, root)
}

fn crawl(root: &Path) -> Arc<FileTree> {
    RepositoryCrawler::new(root, FilterConfig::default())
        .unwrap()
        .get_file_tree()
        .unwrap()
}

fn options(format: PromptFormat) -> PromptOptions {
    PromptOptions::builder()
        .format(format)
        .max_file_size(32u64)
        .build()
        .unwrap()
}

#[test]
fn test_xml_prompt_from_crawl() {
    let (_temp, root) = sample_repo();
    let tree = crawl(&root);
    let access = FileAccess::scoped(&root, WriteMode::DryRun).unwrap();

    let prompt = PromptBuilder::new(&access, options(PromptFormat::Xml))
        .build(&tree)
        .unwrap();

    assert!(prompt.text.starts_with("<repository>\n<name>demo</name>\n"));
    assert!(prompt.text.contains("<file_count>2</file_count>"));
    assert!(
        prompt
            .text
            .contains("<file path='demo/README.md'>\n<![CDATA[\n# Demo\n\n]]>\n</file>")
    );
    assert!(prompt.text.contains("<file path='demo/src/app.py'>"));
    assert!(prompt.text.ends_with("</files>\n</repository>"));

    let included: Vec<_> = prompt.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(included, vec!["demo/README.md", "demo/src/app.py"]);
    assert_eq!(prompt.files[0].source, root.join("README.md"));
    assert_eq!(prompt.files[0].bytes, 7);
}

#[test]
fn test_unusable_files_are_skipped() {
    let (_temp, root) = sample_repo();
    let tree = crawl(&root);
    let access = FileAccess::scoped(&root, WriteMode::DryRun).unwrap();

    let prompt = PromptBuilder::new(&access, options(PromptFormat::Xml))
        .build(&tree)
        .unwrap();

    assert_eq!(prompt.skipped.len(), 2);
    let big = prompt
        .skipped
        .iter()
        .find(|s| s.path == root.join("big.txt"))
        .unwrap();
    assert_eq!(big.reason, SkipReason::TooLarge { size: 64, limit: 32 });
    let binary = prompt
        .skipped
        .iter()
        .find(|s| s.path == root.join("logo.bin"))
        .unwrap();
    assert_eq!(binary.reason, SkipReason::Binary);
    assert!(!prompt.text.contains("logo.bin"));
}

#[test]
fn test_file_removed_after_crawl_is_skipped() {
    let (_temp, root) = sample_repo();
    let tree = crawl(&root);
    fs::remove_file(root.join("README.md")).unwrap();

    let access = FileAccess::scoped(&root, WriteMode::DryRun).unwrap();
    let prompt = PromptBuilder::new(&access, options(PromptFormat::Xml))
        .build(&tree)
        .unwrap();

    assert_eq!(prompt.files.len(), 1);
    assert!(prompt.skipped.iter().any(|s| {
        s.path == root.join("README.md") && matches!(s.reason, SkipReason::Unreadable { .. })
    }));
}

#[test]
fn test_markdown_prompt_with_rules() {
    let (_temp, root) = sample_repo();
    let tree = crawl(&root);
    let access = FileAccess::scoped(&root, WriteMode::DryRun).unwrap();

    let mut rules = IndexMap::new();
    rules.insert("review".to_string(), "Look for bugs.".to_string());
    rules.insert("style".to_string(), "Prefer short functions.".to_string());
    let options = PromptOptions::builder()
        .format(PromptFormat::Markdown)
        .max_file_size(32u64)
        .rules(rules)
        .build()
        .unwrap();

    let prompt = PromptBuilder::new(&access, options).build(&tree).unwrap();
    let text = &prompt.text;

    assert!(text.starts_with("# Repository: demo\n"));
    let review = text.find("### review").unwrap();
    let style = text.find("### style").unwrap();
    let files = text.find("## Files").unwrap();
    assert!(review < style && style < files);
    assert!(text.contains("### demo/src/app.py\n\n```python\nprint('hi')\n```\n"));
    assert!(text.contains("### demo/README.md\n\n```markdown\n# Demo\n```\n"));
}

#[test]
fn test_absolute_paths() {
    let (_temp, root) = sample_repo();
    let tree = crawl(&root);
    let access = FileAccess::scoped(&root, WriteMode::DryRun).unwrap();

    let options = PromptOptions::builder()
        .path_style(PathStyle::Absolute)
        .max_file_size(32u64)
        .build()
        .unwrap();
    let prompt = PromptBuilder::new(&access, options).build(&tree).unwrap();

    let expected = root.join("src").join("app.py");
    assert!(
        prompt
            .text
            .contains(&format!("<file path='{}'>", expected.display()))
    );
}

#[test]
fn test_file_root_is_rejected() {
    let tree = FileTree::new(
        TreeNode::new_file("/repo/single.txt"),
        Fingerprint::new([0; 32]),
        TreeStats::new(),
        Duration::ZERO,
        Vec::new(),
    );
    let access = FileAccess::default();
    let result = PromptBuilder::new(&access, PromptOptions::default()).build(&tree);
    assert!(matches!(result, Err(PromptError::NotADirectory { .. })));
}

#[test]
fn test_outline_and_overview_from_crawl() {
    let (_temp, root) = sample_repo();
    let tree = crawl(&root);

    assert_eq!(
        render_outline(&tree.root),
        "demo\n├── README.md\n├── big.txt\n├── logo.bin\n└── src\n    └── app.py\n"
    );

    let access = FileAccess::scoped(&root, WriteMode::DryRun).unwrap();
    let overview = Overview::collect(&tree, &access);
    assert_eq!(overview.total_files(), 4);
    assert_eq!(overview.total_size(), 7 + 64 + 4 + 12);
    assert!(overview.to_string().starts_with(&format!(
        "Repository Path: {}\nTotal Files: 4\n",
        root.display()
    )));
}
