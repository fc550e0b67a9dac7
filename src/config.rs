//! User configuration.
//!
//! The configuration remembers the folder that was last chosen for sorting
//! and holds optional rules for leaving some files where they are. It lives
//! in a TOML file:
//!
//! ```toml
//! folder = "/home/me/Downloads"
//!
//! [filters]
//! include_hidden = true
//!
//! [filters.exclude]
//! filenames = ["desktop.ini", "Thumbs.db"]
//! extensions = ["part", "crdownload"]
//! patterns = ["~*"]
//! regex = []
//! ```
//!
//! Category rules are fixed and are not configurable here.

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading, saving or compiling configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    #[error("IO error on configuration file {}: {error}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// The folder chosen the last time the program ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<PathBuf>,

    #[serde(default)]
    pub filters: FilterRules,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether dotfiles are sorted too. Defaults to true.
    #[serde(default = "default_include_hidden")]
    pub include_hidden: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,
}

fn default_include_hidden() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            include_hidden: default_include_hidden(),
            exclude: ExcludeRules::default(),
        }
    }
}

/// Files matching any of these rules are left in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact file names.
    #[serde(default)]
    pub filenames: Vec<String>,
    /// Extensions without the dot, case-insensitive.
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Glob patterns matched against the file name.
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Regular expressions matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl Config {
    /// Default configuration location: `$HOME/.config/foldersort/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("foldersort")
                .join("config.toml")
        })
    }

    /// Loads configuration.
    ///
    /// An explicitly given path must exist. Otherwise the default location is
    /// tried, falling back to the built-in defaults when it is absent.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|error| ConfigError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Writes the configuration to `path`, creating parent folders.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |error: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            error,
        };

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(path, content).map_err(io_error)
    }

    /// Compiles the filter rules for matching.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Filter rules with patterns parsed once up front.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    include_hidden: bool,
    filenames: HashSet<String>,
    extensions: HashSet<String>,
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let patterns = rules
            .exclude
            .patterns
            .iter()
            .map(|p| Pattern::new(p).map_err(|_| ConfigError::InvalidGlobPattern(p.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        let regexes = rules
            .exclude
            .regex
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            include_hidden: rules.include_hidden,
            filenames: rules.exclude.filenames.iter().cloned().collect(),
            extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            patterns,
            regexes,
        })
    }

    /// Returns false if the file should be left where it is.
    pub fn should_include(&self, file_path: &Path) -> bool {
        let Some(file_name) = file_path.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };

        if !self.include_hidden && file_name.starts_with('.') {
            return false;
        }
        if self.filenames.contains(&*file_name) {
            return false;
        }
        if let Some(ext) = file_path.extension()
            && self.extensions.contains(&ext.to_string_lossy().to_lowercase())
        {
            return false;
        }
        if self.patterns.iter().any(|p| p.matches(&file_name)) {
            return false;
        }
        !self.regexes.iter().any(|r| r.is_match(&file_name))
    }
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self {
            include_hidden: true,
            filenames: HashSet::new(),
            extensions: HashSet::new(),
            patterns: Vec::new(),
            regexes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn filters_with(exclude: ExcludeRules) -> CompiledFilters {
        Config {
            folder: None,
            filters: FilterRules {
                include_hidden: true,
                exclude,
            },
        }
        .compile_filters()
        .unwrap()
    }

    #[test]
    fn test_default_config_includes_everything() {
        let compiled = Config::default().compile_filters().unwrap();
        assert!(compiled.should_include(Path::new("photo.jpg")));
        assert!(compiled.should_include(Path::new(".hidden")));
        assert!(compiled.should_include(Path::new("Makefile")));
    }

    #[test]
    fn test_hidden_files_can_be_excluded() {
        let config = Config {
            folder: None,
            filters: FilterRules {
                include_hidden: false,
                exclude: ExcludeRules::default(),
            },
        };
        let compiled = config.compile_filters().unwrap();
        assert!(!compiled.should_include(Path::new(".DS_Store")));
        assert!(compiled.should_include(Path::new("visible.txt")));
    }

    #[test]
    fn test_exclude_filename_and_extension() {
        let compiled = filters_with(ExcludeRules {
            filenames: vec!["Thumbs.db".to_string()],
            extensions: vec![".PART".to_string(), "crdownload".to_string()],
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new("Thumbs.db")));
        assert!(!compiled.should_include(Path::new("movie.mp4.part")));
        assert!(!compiled.should_include(Path::new("setup.CRDOWNLOAD")));
        assert!(compiled.should_include(Path::new("movie.mp4")));
    }

    #[test]
    fn test_exclude_glob_and_regex() {
        let compiled = filters_with(ExcludeRules {
            patterns: vec!["~*".to_string()],
            regex: vec![r"^draft_\d+\.txt$".to_string()],
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new("/x/~lock.docx")));
        assert!(!compiled.should_include(Path::new("draft_12.txt")));
        assert!(compiled.should_include(Path::new("draft_final.txt")));
    }

    #[test]
    fn test_invalid_patterns_are_errors() {
        let config = Config {
            folder: None,
            filters: FilterRules {
                include_hidden: true,
                exclude: ExcludeRules {
                    regex: vec!["[invalid(".to_string()],
                    ..Default::default()
                },
            },
        };
        assert!(matches!(
            config.compile_filters(),
            Err(ConfigError::InvalidRegexPattern { .. })
        ));

        let config = Config {
            folder: None,
            filters: FilterRules {
                include_hidden: true,
                exclude: ExcludeRules {
                    patterns: vec!["[unclosed".to_string()],
                    ..Default::default()
                },
            },
        };
        assert!(matches!(
            config.compile_filters(),
            Err(ConfigError::InvalidGlobPattern(_))
        ));
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            folder: Some(PathBuf::from("/data/downloads")),
            filters: FilterRules {
                include_hidden: false,
                exclude: ExcludeRules {
                    filenames: vec!["keep.me".to_string()],
                    ..Default::default()
                },
            },
        };
        config.save(&path).expect("Failed to save config");

        let loaded = Config::load(Some(&path)).expect("Failed to load config");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "folder = \"/srv/inbox\"\n").unwrap();

        let loaded = Config::load(Some(&path)).expect("Failed to load config");
        assert_eq!(loaded.folder, Some(PathBuf::from("/srv/inbox")));
        assert!(loaded.filters.include_hidden);
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let result = Config::load(Some(Path::new("/non/existent/config.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }
}
