//! repoprompt - Crawl a repository and pack its source into an LLM prompt.
//!
//! Usage:
//!   repoprompt tree [PATH]     Show the filtered file tree
//!   repoprompt walk [PATH]     List retained files with sizes
//!   repoprompt prompt [PATH]   Build a prompt from the repository contents
//!   repoprompt --help          Show help

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail, eyre};
use indexmap::IndexMap;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use repoprompt_core::Settings;
use repoprompt_ops::{FileAccess, WriteMode};
use repoprompt_prompt::{
    Overview, PathStyle, PromptBuilder, PromptFormat, PromptOptions, render_outline,
};
use repoprompt_scan::RepositoryCrawler;

#[derive(Parser)]
#[command(
    name = "repoprompt",
    version,
    about = "Pack a repository into a prompt for a language model",
    long_about = "repoprompt walks a repository, leaves out ignored directories, files \
                  and extensions, and lays the remaining source out as one XML or \
                  Markdown prompt.\n\n\
                  Ignore rules and named rule texts are read from the settings file \
                  (see --config)."
)]
struct Cli {
    /// Settings file (defaults to <config dir>/repoprompt/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the filtered file tree
    Tree {
        /// Repository root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Print the tree as JSON
        #[arg(long, conflicts_with = "summary")]
        json: bool,

        /// Print every file with its size instead of the outline
        #[arg(short, long)]
        summary: bool,
    },

    /// List retained files with their sizes
    Walk {
        /// Repository root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build a prompt from the repository contents
    Prompt {
        /// Repository root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Prompt layout
        #[arg(short, long, default_value = "xml")]
        format: FormatArg,

        /// Write absolute file paths instead of <repo>/<relative path>
        #[arg(long)]
        absolute_paths: bool,

        /// Add a rule from a file, as NAME=FILE (repeatable)
        #[arg(short, long = "rule", value_name = "NAME=FILE", value_parser = parse_rule)]
        rules: Vec<(String, PathBuf)>,

        /// Skip files larger than this (e.g., "512KB", "2MB")
        #[arg(long)]
        max_file_size: Option<String>,

        /// Save the prompt to a file instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Actually write --output (otherwise only report what would happen)
        #[arg(long, requires = "output")]
        write: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum FormatArg {
    #[default]
    Xml,
    Markdown,
}

impl From<FormatArg> for PromptFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Xml => PromptFormat::Xml,
            FormatArg::Markdown => PromptFormat::Markdown,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Command::Tree {
            path,
            json,
            summary,
        } => run_tree(&path, &settings, json, summary)?,
        Command::Walk { path, json } => run_walk(&path, &settings, json)?,
        Command::Prompt {
            path,
            format,
            absolute_paths,
            rules,
            max_file_size,
            output,
            write,
        } => {
            let mut options = PromptOptions::from_settings(&settings);
            options.format = format.into();
            if absolute_paths {
                options.path_style = PathStyle::Absolute;
            }
            if let Some(size) = max_file_size {
                options.max_file_size = parse_size(&size)?;
            }
            options.rules.extend(read_rules(&rules)?);

            let mode = if write {
                WriteMode::Apply
            } else {
                WriteMode::DryRun
            };
            run_prompt(&path, &settings, options, output.as_deref(), mode)?;
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` or the verbosity flag.
fn setup_tracing(verbose: u8) {
    use tracing_subscriber::fmt;

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .init();
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path.map(Path::to_path_buf).or_else(Settings::default_path) {
        Some(path) => {
            debug!("Loading settings from {}", path.display());
            Settings::load(&path).context("Invalid settings")
        }
        None => Ok(Settings::default()),
    }
}

fn open_crawler(path: &Path, settings: &Settings) -> Result<RepositoryCrawler> {
    RepositoryCrawler::new(path, settings.filter.clone())
        .with_context(|| format!("Cannot crawl {}", path.display()))
}

/// Print the filtered tree.
fn run_tree(path: &Path, settings: &Settings, json: bool, summary: bool) -> Result<()> {
    let crawler = open_crawler(path, settings)?;
    let tree = crawler.get_file_tree().context("Crawl failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&*tree)?);
        return Ok(());
    }

    if summary {
        let access = FileAccess::scoped(crawler.root_path(), WriteMode::DryRun)?;
        let overview = Overview::collect(&tree, &access);
        print!("{overview}");
        println!();
        println!("Total size: {}", format_size(overview.total_size()));
    } else {
        print!("{}", render_outline(&tree.root));
        println!();
        println!(
            "{} files, {} directories",
            tree.total_files(),
            tree.total_dirs()
        );
    }

    report_warnings(tree.warnings.len());
    Ok(())
}

/// Print every retained file with its size.
fn run_walk(path: &Path, settings: &Settings, json: bool) -> Result<()> {
    let crawler = open_crawler(path, settings)?;
    let listing = crawler.walk().context("Walk failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    let root = crawler.root_path();
    for record in &listing.records {
        let shown = record.path.strip_prefix(root).unwrap_or(&record.path);
        println!("{:>10}  {}", format_size(record.size), shown.display());
    }
    println!("{}", "─".repeat(40));
    println!(
        "{:>10}  {} files",
        format_size(listing.total_size()),
        listing.len()
    );

    report_warnings(listing.warnings.len());
    Ok(())
}

/// Build the prompt and print or save it.
fn run_prompt(
    path: &Path,
    settings: &Settings,
    options: PromptOptions,
    output: Option<&Path>,
    mode: WriteMode,
) -> Result<()> {
    let crawler = open_crawler(path, settings)?;
    let tree = crawler.get_file_tree().context("Crawl failed")?;

    let access = FileAccess::scoped(crawler.root_path(), WriteMode::DryRun)?;
    let prompt = PromptBuilder::new(&access, options)
        .build(&tree)
        .context("Failed to build prompt")?;

    eprintln!(
        "Included {} files, skipped {}",
        prompt.files.len(),
        prompt.skipped.len()
    );
    for skipped in &prompt.skipped {
        eprintln!("  skipped {}: {}", skipped.path.display(), skipped.reason);
    }

    match output {
        Some(output) => {
            let report = FileAccess::new(mode)
                .write(output, &prompt.text)
                .context("Failed to save prompt")?;
            if report.applied {
                eprintln!(
                    "Saved prompt to {} ({})",
                    report.path.display(),
                    format_size(report.bytes as u64)
                );
            } else {
                eprintln!(
                    "Dry run: {} would have been {} ({}); pass --write to save it",
                    report.path.display(),
                    report.action,
                    format_size(report.bytes as u64)
                );
            }
        }
        None => println!("{}", prompt.text),
    }

    Ok(())
}

/// Read `NAME=FILE` rule arguments in order.
fn read_rules(rules: &[(String, PathBuf)]) -> Result<IndexMap<String, String>> {
    let access = FileAccess::default();
    let mut loaded = IndexMap::new();
    for (name, file) in rules {
        let content = access
            .read(file)
            .with_context(|| format!("Cannot read rule {name}"))?;
        if content.trim().is_empty() {
            bail!("Rule {name} is empty: {}", file.display());
        }
        loaded.insert(name.clone(), content);
    }
    Ok(loaded)
}

fn parse_rule(s: &str) -> std::result::Result<(String, PathBuf), String> {
    let (name, file) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=FILE, got {s:?}"))?;
    let name = name.trim();
    if name.is_empty() || file.is_empty() {
        return Err(format!("expected NAME=FILE, got {s:?}"));
    }
    Ok((name.to_string(), PathBuf::from(file)))
}

fn report_warnings(count: usize) {
    if count > 0 {
        let noun = if count == 1 { "entry" } else { "entries" };
        eprintln!("{count} {noun} skipped (run with -v for details)");
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Parse a size string (e.g., "512", "64KB", "2MB").
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    let digits = s.trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.');
    let unit = &s[digits.len()..];

    let multiplier: u64 = match unit {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        _ => return Err(eyre!("Unknown size unit in {s:?}")),
    };
    let num: f64 = digits
        .parse()
        .with_context(|| format!("Invalid size {s:?}"))?;

    Ok((num * multiplier as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("64kb").unwrap(), 64 * 1024);
        assert_eq!(parse_size("2MB").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size("1.5K").unwrap(), 1536);
        assert!(parse_size("10XB").is_err());
        assert!(parse_size("MB").is_err());
    }

    #[test]
    fn test_parse_rule() {
        assert_eq!(
            parse_rule("style=rules/style.md").unwrap(),
            ("style".to_string(), PathBuf::from("rules/style.md"))
        );
        assert!(parse_rule("style").is_err());
        assert!(parse_rule("=file.md").is_err());
        assert!(parse_rule("style=").is_err());
    }

    #[test]
    fn test_cli_parses_prompt_flags() {
        let cli = Cli::try_parse_from([
            "repoprompt",
            "-vv",
            "prompt",
            "repo",
            "--format",
            "markdown",
            "--rule",
            "a=a.md",
            "--rule",
            "b=b.md",
            "--output",
            "out.md",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Prompt {
                path,
                format,
                rules,
                write,
                ..
            } => {
                assert_eq!(path, PathBuf::from("repo"));
                assert!(matches!(format, FormatArg::Markdown));
                assert_eq!(rules.len(), 2);
                assert!(!write);
            }
            _ => panic!("expected prompt command"),
        }
    }

    #[test]
    fn test_write_requires_output() {
        assert!(Cli::try_parse_from(["repoprompt", "prompt", "--write"]).is_err());
    }
}
