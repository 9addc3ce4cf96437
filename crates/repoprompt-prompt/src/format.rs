//! XML and Markdown prompt layouts.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Prompt text layout.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum PromptFormat {
    /// `<repository>` document with CDATA bodies.
    #[default]
    Xml,
    /// Headings and fenced code blocks.
    Markdown,
}

/// A file body ready to be laid out.
pub(crate) struct Section<'a> {
    pub path: &'a str,
    pub content: &'a str,
}

pub(crate) fn render(
    format: PromptFormat,
    name: &str,
    rules: &IndexMap<String, String>,
    files: &[Section<'_>],
) -> String {
    match format {
        PromptFormat::Xml => render_xml(name, rules, files),
        PromptFormat::Markdown => render_markdown(name, rules, files),
    }
}

fn render_xml(name: &str, rules: &IndexMap<String, String>, files: &[Section<'_>]) -> String {
    let mut parts = vec![
        "<repository>".to_string(),
        format!("<name>{}</name>", escape_text(name)),
        format!("<file_count>{}</file_count>", files.len()),
    ];

    if !rules.is_empty() {
        parts.push("<rules>".to_string());
        for (rule, body) in rules {
            parts.push(format!("<rule name='{}'>", escape_attr(rule)));
            parts.push(cdata(body));
            parts.push("</rule>".to_string());
        }
        parts.push("</rules>".to_string());
    }

    parts.push("<files>".to_string());
    for file in files {
        parts.push(format!("<file path='{}'>", escape_attr(file.path)));
        parts.push(cdata(file.content));
        parts.push("</file>".to_string());
    }
    parts.push("</files>".to_string());
    parts.push("</repository>".to_string());

    parts.join("\n")
}

fn render_markdown(name: &str, rules: &IndexMap<String, String>, files: &[Section<'_>]) -> String {
    let mut lines = vec![
        format!("# Repository: {name}"),
        String::new(),
        format!("File count: {}", files.len()),
    ];

    if !rules.is_empty() {
        lines.extend([String::new(), "## Rules".to_string()]);
        for (rule, body) in rules {
            lines.extend([
                String::new(),
                format!("### {rule}"),
                String::new(),
                body.trim_end_matches('\n').to_string(),
            ]);
        }
    }

    lines.extend([String::new(), "## Files".to_string()]);
    for file in files {
        let fence = fence_for(file.content);
        lines.extend([
            String::new(),
            format!("### {}", file.path),
            String::new(),
            format!("{fence}{}", language_for(Path::new(file.path))),
        ]);
        if !file.content.is_empty() {
            lines.push(file.content.trim_end_matches('\n').to_string());
        }
        lines.push(fence);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Wrap `body` in CDATA on its own lines. A `]]>` inside the body closes
/// one section and opens the next.
fn cdata(body: &str) -> String {
    format!("<![CDATA[\n{}\n]]>", body.replace("]]>", "]]]]><![CDATA[>"))
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('\'', "&apos;")
}

/// Backtick fence one longer than the longest run inside `content`, at least three.
fn fence_for(content: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in content.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

/// Code fence language for a file, from its extension.
pub fn language_for(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return "text";
    };
    match ext.to_ascii_lowercase().as_str() {
        "py" | "pyi" => "python",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "ts" | "tsx" => "typescript",
        "rs" => "rust",
        "go" => "go",
        "java" => "java",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" | "hh" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "php" => "php",
        "swift" => "swift",
        "kt" | "kts" => "kotlin",
        "sh" | "bash" | "zsh" => "bash",
        "html" | "htm" => "html",
        "css" => "css",
        "scss" => "scss",
        "md" | "markdown" => "markdown",
        "json" => "json",
        "toml" => "toml",
        "yaml" | "yml" => "yaml",
        "xml" => "xml",
        "sql" => "sql",
        _ => "text",
    }
}
