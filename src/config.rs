//! Scan configuration.
//!
//! Controls which parts of a tree are walked and the bounds used by the
//! brace-delimited boundary extractor.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating a scan configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid excluded_paths pattern {pattern:?}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("{field} must be greater than zero")]
    ZeroWindow { field: &'static str },
}

/// Default directory-name substrings that are never descended into.
pub const DEFAULT_SKIP_DIRS: &[&str] = &[
    "node_modules",
    ".agent",
    "dist",
    "build",
    "venv",
    "__pycache__",
    ".git",
    "target",
];

/// Default brace-matching lookahead in bytes.
pub const DEFAULT_LOOKAHEAD_WINDOW: usize = 10_000;

/// Default maximum distance between a declaration and its arrow body opener.
pub const DEFAULT_ARROW_WINDOW: usize = 500;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// A directory is skipped when its name contains any of these substrings.
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,
    /// Glob patterns for paths to exclude (e.g. "**/generated/**").
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    #[serde(default = "default_lookahead_window")]
    pub lookahead_window: usize,
    #[serde(default = "default_arrow_window")]
    pub arrow_window: usize,
    #[serde(default)]
    pub follow_links: bool,
}

fn default_skip_dirs() -> Vec<String> {
    DEFAULT_SKIP_DIRS.iter().map(|s| s.to_string()).collect()
}

fn default_lookahead_window() -> usize {
    DEFAULT_LOOKAHEAD_WINDOW
}

fn default_arrow_window() -> usize {
    DEFAULT_ARROW_WINDOW
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            skip_dirs: default_skip_dirs(),
            excluded_paths: Vec::new(),
            lookahead_window: DEFAULT_LOOKAHEAD_WINDOW,
            arrow_window: DEFAULT_ARROW_WINDOW,
            follow_links: false,
        }
    }
}

impl ScanConfig {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: ScanConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lookahead_window == 0 {
            return Err(ConfigError::ZeroWindow {
                field: "lookahead_window",
            });
        }
        for pattern in &self.excluded_paths {
            globset::Glob::new(pattern).map_err(|source| ConfigError::Glob {
                pattern: pattern.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Whether a directory name contains one of the skip substrings.
    pub fn is_skipped_dir(&self, name: &str) -> bool {
        self.skip_dirs.iter().any(|s| name.contains(s.as_str()))
    }

    /// Build a matcher for `excluded_paths`. Invalid patterns are ignored
    /// here; `validate` reports them.
    pub fn exclusion_matcher(&self) -> globset::GlobSet {
        let mut builder = globset::GlobSetBuilder::new();
        for pattern in &self.excluded_paths {
            if let Ok(glob) = globset::Glob::new(pattern) {
                builder.add(glob);
            }
        }
        builder.build().unwrap_or_else(|_| globset::GlobSet::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config_keeps_defaults() {
        let yaml = r#"
skip_dirs: ["vendor"]
excluded_paths: ["**/generated/**"]
"#;
        let config: ScanConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.skip_dirs, vec!["vendor"]);
        assert_eq!(config.lookahead_window, DEFAULT_LOOKAHEAD_WINDOW);
        assert_eq!(config.arrow_window, DEFAULT_ARROW_WINDOW);
        assert!(config.validate().is_ok());
        assert!(config
            .exclusion_matcher()
            .is_match("src/generated/client.ts"));
    }

    #[test]
    fn test_skip_dirs_match_substrings() {
        let config = ScanConfig::default();
        assert!(config.is_skipped_dir("node_modules"));
        assert!(config.is_skipped_dir("my-build-output"));
        assert!(config.is_skipped_dir(".venv"));
        assert!(!config.is_skipped_dir("src"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ScanConfig {
            lookahead_window: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroWindow { .. })
        ));

        let config = ScanConfig {
            excluded_paths: vec!["[".to_string()],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Glob { .. })));
    }
}
