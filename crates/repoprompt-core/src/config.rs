//! Filter configuration and user settings.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Glob patterns tested against directory and file basenames.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnorePatterns {
    /// Directories whose name matches are pruned before descending.
    #[serde(default)]
    pub directories: Vec<String>,

    /// Files whose name matches are left out.
    #[serde(default)]
    pub files: Vec<String>,
}

/// Which entries a crawl leaves out.
///
/// Replaced wholesale on update; never edited in place by the crawler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), default, build_fn(validate = "Self::validate"))]
pub struct FilterConfig {
    /// Directory and file name patterns.
    #[serde(default)]
    pub ignore_patterns: IgnorePatterns,

    /// Lower-case extensions including the dot, e.g. `.png`.
    #[serde(default)]
    pub excluded_extensions: Vec<String>,
}

const DEFAULT_IGNORED_DIRECTORIES: &[&str] = &[
    "__pycache__",
    ".git",
    "node_modules",
    "venv",
    ".venv",
    "env",
    ".env",
    "build",
    "dist",
    ".pytest_cache",
    "target",
];

const DEFAULT_IGNORED_FILES: &[&str] = &[
    "*.pyc",
    "*.pyo",
    "*.pyd",
    ".DS_Store",
    "Thumbs.db",
    "*.log",
    "*.sqlite",
    "*.db",
];

const DEFAULT_EXCLUDED_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".mp3", ".mp4", ".avi", ".mov", ".zip", ".tar",
    ".gz", ".7z", ".exe", ".dll", ".so", ".dylib",
];

impl FilterConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref patterns) = self.ignore_patterns {
            validate_patterns("directory", &patterns.directories).map_err(|e| e.to_string())?;
            validate_patterns("file", &patterns.files).map_err(|e| e.to_string())?;
        }
        if let Some(ref extensions) = self.excluded_extensions {
            validate_extensions(extensions).map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

impl FilterConfig {
    /// Create a new filter config builder.
    pub fn builder() -> FilterConfigBuilder {
        FilterConfigBuilder::default()
    }

    /// Create a config from the three pattern lists.
    pub fn new<D, F, E>(directories: D, files: F, excluded_extensions: E) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            ignore_patterns: IgnorePatterns {
                directories: directories.into_iter().map(Into::into).collect(),
                files: files.into_iter().map(Into::into).collect(),
            },
            excluded_extensions: excluded_extensions.into_iter().map(Into::into).collect(),
        }
    }

    /// The shipped defaults: VCS metadata, virtualenvs, build output,
    /// compiled artifacts and common binary media.
    pub fn recommended() -> Self {
        Self::new(
            DEFAULT_IGNORED_DIRECTORIES.iter().copied(),
            DEFAULT_IGNORED_FILES.iter().copied(),
            DEFAULT_EXCLUDED_EXTENSIONS.iter().copied(),
        )
    }

    /// Parse an untyped mapping such as one handed over by a settings store.
    ///
    /// `ignore_patterns` must be present and be a mapping; its lists and
    /// `excluded_extensions` default to empty when absent.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        let Some(object) = value.as_object() else {
            return Err(ConfigError::Shape {
                message: "configuration must be a mapping".to_string(),
            });
        };
        if !object.get("ignore_patterns").is_some_and(|v| v.is_object()) {
            return Err(ConfigError::Shape {
                message: "ignore_patterns must be a mapping".to_string(),
            });
        }

        let config: Self = serde_json::from_value(value).map_err(|e| ConfigError::Shape {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every pattern and extension is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_patterns("directory", &self.ignore_patterns.directories)?;
        validate_patterns("file", &self.ignore_patterns.files)?;
        validate_extensions(&self.excluded_extensions)
    }

    /// Whether all three lists are empty.
    pub fn is_empty(&self) -> bool {
        self.ignore_patterns.directories.is_empty()
            && self.ignore_patterns.files.is_empty()
            && self.excluded_extensions.is_empty()
    }
}

fn validate_patterns(list: &'static str, patterns: &[String]) -> Result<(), ConfigError> {
    for pattern in patterns {
        let reason = if pattern.is_empty() {
            "pattern is empty"
        } else if pattern.contains('\0') {
            "pattern contains a NUL byte"
        } else if pattern.contains('/') || pattern.contains(std::path::MAIN_SEPARATOR) {
            "patterns match a single name and cannot contain a path separator"
        } else {
            continue;
        };
        return Err(ConfigError::Pattern {
            list,
            pattern: pattern.clone(),
            reason,
        });
    }
    Ok(())
}

fn validate_extensions(extensions: &[String]) -> Result<(), ConfigError> {
    match extensions
        .iter()
        .find(|ext| !ext.starts_with('.') || ext.len() < 2 || ext.contains('\0'))
    {
        Some(ext) => Err(ConfigError::Extension {
            extension: ext.clone(),
        }),
        None => Ok(()),
    }
}

/// User settings read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Crawl filter.
    pub filter: FilterConfig,

    /// Show files as `<repo>/<relative path>` instead of absolute paths.
    pub use_relative_paths: bool,

    /// Files larger than this are left out of prompts.
    pub max_file_size: u64,

    /// Named instruction texts, in file order.
    pub rules: IndexMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            filter: FilterConfig::recommended(),
            use_relative_paths: true,
            max_file_size: 1024 * 1024,
            rules: IndexMap::new(),
        }
    }
}

impl Settings {
    /// `<config dir>/repoprompt/config.toml`, when the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("repoprompt").join("config.toml"))
    }

    /// Load settings from `path`; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No settings file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let settings: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        tracing::info!("Settings loaded from {}", path.display());
        Ok(settings)
    }

    /// Check the filter and that no rule is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.filter.validate()?;
        for (name, content) in &self.rules {
            if name.trim().is_empty() {
                return Err(ConfigError::Rule {
                    name: name.clone(),
                    reason: "rule name cannot be empty",
                });
            }
            if content.trim().is_empty() {
                return Err(ConfigError::Rule {
                    name: name.clone(),
                    reason: "rule content cannot be empty",
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_builder() {
        let config = FilterConfig::builder()
            .ignore_patterns(IgnorePatterns {
                directories: vec!["node_modules".to_string()],
                files: vec!["*.log".to_string()],
            })
            .excluded_extensions(vec![".png".to_string()])
            .build()
            .unwrap();

        assert_eq!(config.ignore_patterns.directories, vec!["node_modules"]);
        assert_eq!(config.excluded_extensions, vec![".png"]);
    }

    #[test]
    fn test_config_builder_rejects_bad_extension() {
        let result = FilterConfig::builder()
            .excluded_extensions(vec!["png".to_string()])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_recommended_is_valid() {
        let config = FilterConfig::recommended();
        assert!(config.validate().is_ok());
        assert!(config.ignore_patterns.directories.contains(&".git".to_string()));
        assert!(config.ignore_patterns.files.contains(&"*.log".to_string()));
        assert!(config.excluded_extensions.contains(&".png".to_string()));
    }

    #[test]
    fn test_default_is_empty() {
        assert!(FilterConfig::default().is_empty());
    }

    #[test]
    fn test_from_value_defaults_missing_lists() {
        let config = FilterConfig::from_value(json!({
            "ignore_patterns": { "directories": ["build"] }
        }))
        .unwrap();

        assert_eq!(config.ignore_patterns.directories, vec!["build"]);
        assert!(config.ignore_patterns.files.is_empty());
        assert!(config.excluded_extensions.is_empty());
    }

    #[test]
    fn test_from_value_rejects_bad_shapes() {
        assert!(FilterConfig::from_value(json!(["build"])).is_err());
        assert!(FilterConfig::from_value(json!({ "excluded_extensions": [] })).is_err());
        assert!(FilterConfig::from_value(json!({ "ignore_patterns": ["build"] })).is_err());
        assert!(
            FilterConfig::from_value(json!({
                "ignore_patterns": { "directories": ["build", 3] }
            }))
            .is_err()
        );
        assert!(
            FilterConfig::from_value(json!({
                "ignore_patterns": {},
                "excluded_extensions": "png"
            }))
            .is_err()
        );
    }

    #[test]
    fn test_validate_patterns() {
        let config = FilterConfig::new(["build/"], Vec::<&str>::new(), Vec::<String>::new());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Pattern { list: "directory", .. })
        ));

        let config = FilterConfig::new(Vec::<&str>::new(), [""], Vec::<String>::new());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Pattern { list: "file", .. })
        ));
    }

    #[test]
    fn test_settings_from_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
use_relative_paths = false

[filter]
excluded_extensions = [".bin"]

[filter.ignore_patterns]
directories = ["vendor"]

[rules]
style = "Prefer small functions."
"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert!(!settings.use_relative_paths);
        assert_eq!(settings.max_file_size, 1024 * 1024);
        assert_eq!(settings.filter.ignore_patterns.directories, vec!["vendor"]);
        assert!(settings.filter.ignore_patterns.files.is_empty());
        assert_eq!(settings.filter.excluded_extensions, vec![".bin"]);
        assert_eq!(settings.rules["style"], "Prefer small functions.");
    }

    #[test]
    fn test_settings_missing_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_settings_rejects_blank_rule() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[rules]\nempty = \"   \"\n").unwrap();

        assert!(matches!(
            Settings::load(&path),
            Err(ConfigError::Rule { .. })
        ));
    }
}
