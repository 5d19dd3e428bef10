//! Run configuration: audit log location, classification rules, and
//! file filtering rules, loaded from TOML.
//!
//! The source and destination roots come from the command line; everything
//! else is configurable through a TOML file and has sensible defaults.
//!
//! # Configuration File Format
//!
//! ```toml
//! [paths]
//! log_file = "organization_log.csv"   # relative paths resolve under the destination root
//!
//! [rules]
//! fallback = "Others"
//!
//! [rules.map]
//! ".heic" = "Images"                  # extends or overrides the built-in table
//!
//! [filters]
//! skip_hidden = true
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! extensions = ["tmp", "partial"]
//! patterns = ["*.crdownload"]
//! regex = []
//! ```

use crate::audit_log::DEFAULT_LOG_FILE;
use crate::classifier::{CategoryRules, DEFAULT_FALLBACK};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur during configuration loading and filter compilation.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(
                    f,
                    "Invalid glob pattern '{}': expected *.ext or dir/**",
                    pattern
                )
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level run configuration, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizeConfig {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Extension-to-category rule settings.
    #[serde(default)]
    pub rules: RulesConfig,

    /// File filtering rules.
    #[serde(default)]
    pub filters: FilterRules,
}

/// Path settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Audit log location. A relative path resolves under the destination root.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

fn default_log_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FILE)
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
        }
    }
}

/// Classification rule settings.
///
/// The `map` entries extend the built-in extension table; an entry for an
/// extension the table already covers replaces the built-in category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Category for extensions with no rule. Defaults to "Others".
    #[serde(default = "default_fallback")]
    pub fallback: String,

    /// Extension overrides, e.g. `".heic" = "Images"`.
    #[serde(default)]
    pub map: HashMap<String, String>,
}

fn default_fallback() -> String {
    DEFAULT_FALLBACK.to_string()
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            fallback: default_fallback(),
            map: HashMap::new(),
        }
    }
}

/// Root-level filter rules configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to skip hidden files (starting with "."). Defaults to true.
    #[serde(default = "default_skip_hidden")]
    pub skip_hidden: bool,

    /// Rules for excluding files.
    #[serde(default)]
    pub exclude: ExcludeRules,
}

fn default_skip_hidden() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            skip_hidden: true,
            exclude: ExcludeRules::default(),
        }
    }
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// File extensions to exclude (e.g., "bak", "tmp", "log").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Glob patterns to exclude (e.g., "*.tmp").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Regex patterns to exclude (for advanced users).
    #[serde(default)]
    pub regex: Vec<String>,
}

impl OrganizeConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.dirsortrc.toml` in the current directory
    /// 3. Look for `~/.config/dirsort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        // If explicitly specified, load from that path
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        // Try current directory
        let local_config = PathBuf::from(".dirsortrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        // Try home directory
        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("dirsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        // Fall back to defaults
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Builds the classification rule set: the built-in table extended by
    /// the configured overrides, with the configured fallback.
    pub fn category_rules(&self) -> CategoryRules {
        let mut rules = CategoryRules::new();
        rules.set_fallback(&self.rules.fallback);
        for (extension, category) in &self.rules.map {
            rules.add_rule(extension, category);
        }
        rules
    }

    /// Compile the filter configuration into optimized structures for matching.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Compiled, optimized filter structures for efficient file matching.
///
/// Pre-processes all filter rules (glob patterns, regex patterns, etc.)
/// into efficient data structures so that matching does not reparse
/// patterns on each file.
#[derive(Debug)]
pub struct CompiledFilters {
    skip_hidden: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        // Pre-compile all glob patterns and validate them
        let exclude_patterns = rules
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Pre-compile all regex patterns and validate them
        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            skip_hidden: rules.skip_hidden,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// Compiled form of the default filter rules.
    pub fn defaults() -> Self {
        // The default rules contain no patterns, so compilation cannot fail
        Self::new(&FilterRules::default()).unwrap_or(Self {
            skip_hidden: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
        })
    }

    /// Check if a file should be included in organization (not excluded).
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. Hidden file filter - if hidden and skipping is enabled, exclude
    /// 2. Exact filename match - if matched, exclude
    /// 3. File extension match - if matched, exclude
    /// 4. Glob pattern match - if matched, exclude
    /// 5. Regex pattern match - if matched, exclude
    /// 6. Default: include
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        // 1. Check hidden file filter
        if self.skip_hidden && file_name.starts_with('.') {
            return false;
        }

        // 2. Check exact filename match
        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        // 3. Check extension match
        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        // 4. Check glob patterns against the file name
        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches(&file_name))
        {
            return false;
        }

        // 5. Check regex patterns
        if self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
        {
            return false;
        }

        // 6. Include by default
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrganizeConfig::default();
        assert_eq!(config.paths.log_file, PathBuf::from("organization_log.csv"));
        assert_eq!(config.rules.fallback, "Others");
        assert!(config.rules.map.is_empty());
        assert!(config.filters.skip_hidden);
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [paths]
            log_file = "audit.csv"

            [rules]
            fallback = "Misc"

            [rules.map]
            ".heic" = "Images"

            [filters]
            skip_hidden = false

            [filters.exclude]
            filenames = ["Thumbs.db"]
            extensions = ["tmp"]
        "#;

        let config: OrganizeConfig = toml::from_str(toml_str).expect("valid TOML");
        assert_eq!(config.paths.log_file, PathBuf::from("audit.csv"));
        assert_eq!(config.rules.fallback, "Misc");
        assert_eq!(config.rules.map[".heic"], "Images");
        assert!(!config.filters.skip_hidden);
        assert_eq!(config.filters.exclude.filenames, vec!["Thumbs.db"]);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: OrganizeConfig = toml::from_str(
            r#"
            [rules.map]
            ".log" = "Logs"
        "#,
        )
        .expect("valid TOML");

        assert_eq!(config.paths.log_file, PathBuf::from("organization_log.csv"));
        assert_eq!(config.rules.fallback, "Others");
        assert_eq!(config.rules.map[".log"], "Logs");
    }

    #[test]
    fn test_category_rules_apply_overrides() {
        let config: OrganizeConfig = toml::from_str(
            r#"
            [rules]
            fallback = "Unsorted"

            [rules.map]
            ".pdf" = "Paperwork"
            "heic" = "Images"
        "#,
        )
        .expect("valid TOML");

        let rules = config.category_rules();
        assert_eq!(rules.classify(".pdf"), "Paperwork");
        assert_eq!(rules.classify(".heic"), "Images");
        assert_eq!(rules.classify(".jpg"), "Images");
        assert_eq!(rules.classify(".xyz"), "Unsorted");
    }

    #[test]
    fn test_hidden_file_excluded_by_default() {
        let filters = CompiledFilters::defaults();
        assert!(!filters.should_include(Path::new(".DS_Store")));
        assert!(!filters.should_include(Path::new(".gitignore")));
        assert!(filters.should_include(Path::new("report.pdf")));
    }

    #[test]
    fn test_hidden_file_included_when_enabled() {
        let rules = FilterRules {
            skip_hidden: false,
            exclude: ExcludeRules::default(),
        };
        let filters = CompiledFilters::new(&rules).unwrap();
        assert!(filters.should_include(Path::new(".DS_Store")));
    }

    #[test]
    fn test_exclude_exact_filename() {
        let rules = FilterRules {
            skip_hidden: false,
            exclude: ExcludeRules {
                filenames: vec!["Thumbs.db".to_string()],
                ..Default::default()
            },
        };
        let filters = CompiledFilters::new(&rules).unwrap();

        assert!(!filters.should_include(Path::new("Thumbs.db")));
        assert!(filters.should_include(Path::new("image.jpg")));
    }

    #[test]
    fn test_exclude_extensions_case_insensitive() {
        let rules = FilterRules {
            skip_hidden: false,
            exclude: ExcludeRules {
                extensions: vec!["bak".to_string(), ".tmp".to_string()],
                ..Default::default()
            },
        };
        let filters = CompiledFilters::new(&rules).unwrap();

        assert!(!filters.should_include(Path::new("file.bak")));
        assert!(!filters.should_include(Path::new("file.BAK")));
        assert!(!filters.should_include(Path::new("file.tmp")));
        assert!(filters.should_include(Path::new("file.txt")));
    }

    #[test]
    fn test_exclude_glob_patterns() {
        let rules = FilterRules {
            skip_hidden: false,
            exclude: ExcludeRules {
                patterns: vec!["*.crdownload".to_string(), "~$*".to_string()],
                ..Default::default()
            },
        };
        let filters = CompiledFilters::new(&rules).unwrap();

        assert!(!filters.should_include(Path::new("movie.mkv.crdownload")));
        assert!(!filters.should_include(Path::new("~$draft.docx")));
        assert!(filters.should_include(Path::new("movie.mkv")));
    }

    #[test]
    fn test_exclude_regex() {
        let rules = FilterRules {
            skip_hidden: false,
            exclude: ExcludeRules {
                regex: vec![r"^backup_\d+".to_string()],
                ..Default::default()
            },
        };
        let filters = CompiledFilters::new(&rules).unwrap();

        assert!(!filters.should_include(Path::new("backup_2024.zip")));
        assert!(filters.should_include(Path::new("backup.zip")));
    }

    #[test]
    fn test_invalid_regex_returns_error() {
        let rules = FilterRules {
            skip_hidden: false,
            exclude: ExcludeRules {
                regex: vec!["[invalid(".to_string()],
                ..Default::default()
            },
        };
        assert!(CompiledFilters::new(&rules).is_err());
    }

    #[test]
    fn test_invalid_glob_returns_error() {
        let rules = FilterRules {
            skip_hidden: false,
            exclude: ExcludeRules {
                patterns: vec!["[invalid".to_string()],
                ..Default::default()
            },
        };
        assert!(CompiledFilters::new(&rules).is_err());
    }

    #[test]
    fn test_load_missing_explicit_config_is_error() {
        let result = OrganizeConfig::load_from_file(Path::new("/no/such/config.toml"));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }
}
