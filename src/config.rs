//! User configuration.
//!
//! Settings are read from a TOML file. Every section is optional:
//!
//! ```toml
//! [rules]
//! jpg = "Images"
//! png = "Images"
//! pdf = "Documents"
//!
//! [unmapped]
//! policy = "unsorted"   # or "leave"
//! label = "Unsorted"
//!
//! [logging]
//! level = "warn"
//! ```
//!
//! Rules given here are only defaults for a run; rules passed on the command
//! line are layered on top and nothing is ever written back.

use crate::categorizer::{DEFAULT_UNSORTED_LABEL, UnmappedPolicy};
use crate::mapping::{ExtensionMapping, MappingError, MappingRow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".extsortrc.toml";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("invalid configuration in {}: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },
    /// IO error while reading configuration.
    #[error("failed to read configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The `[rules]` table does not form a valid mapping.
    #[error("invalid rule in configuration: {0}")]
    Rules(#[from] MappingError),
}

/// Top-level configuration file contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extension → folder rules, e.g. `jpg = "Images"`. Keys are normalized
    /// like any other rule, so `".JPG"` and `jpg` are the same extension.
    pub rules: BTreeMap<String, String>,
    /// The `[unmapped]` section.
    pub unmapped: UnmappedConfig,
    /// The `[logging]` section.
    pub logging: LoggingConfig,
    /// File the configuration was read from; `None` for built-in defaults.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// How files without a rule are treated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnmappedConfig {
    /// `"unsorted"` groups them under [`Self::label`] in previews,
    /// `"leave"` leaves them out.
    pub policy: UnmappedPolicy,
    /// Label of the preview bucket for unmapped files.
    pub label: String,
}

impl Default for UnmappedConfig {
    fn default() -> Self {
        Self {
            policy: UnmappedPolicy::default(),
            label: DEFAULT_UNSORTED_LABEL.to_string(),
        }
    }
}

/// Logging settings. `--log-level` and `RUST_LOG` take precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.extsortrc.toml` in the current directory
    /// 3. Look for `extsort/config.toml` in the platform config directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but
    /// cannot be read, or if any file found cannot be parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(user_config) = Self::user_config_path() {
            if user_config.exists() {
                return Self::load_from_file(&user_config);
            }
        }

        Ok(Self::default())
    }

    /// `<config dir>/extsort/config.toml`, e.g. `~/.config/extsort/config.toml` on Linux.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("extsort").join("config.toml"))
    }

    /// Load configuration from a specific file.
    ///
    /// The returned config records `path` in [`Config::source`].
    ///
    /// # Errors
    ///
    /// `NotFound` if `path` does not exist, `Io` if it cannot be read,
    /// `Invalid` (carrying `path`) for bad TOML and `Rules` for a bad
    /// `[rules]` table.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::parse(&content).map_err(|e| match e {
            ConfigError::Invalid { reason, .. } => ConfigError::Invalid {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parses configuration text. The rules are validated eagerly so a bad
    /// file is reported at load time rather than on first use.
    ///
    /// # Errors
    ///
    /// `Invalid` for malformed TOML or unknown values, `Rules` if the
    /// `[rules]` table does not form a valid mapping.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Invalid {
            path: PathBuf::new(),
            reason: e.to_string(),
        })?;
        config.mapping()?;
        Ok(config)
    }

    /// The configured rules as a mapping.
    ///
    /// # Errors
    ///
    /// Returns the first [`MappingError`] found in the `[rules]` table.
    pub fn mapping(&self) -> Result<ExtensionMapping, MappingError> {
        let rows: Vec<MappingRow> = self
            .rules
            .iter()
            .map(|(ext, folder)| MappingRow::new(ext.as_str(), folder.as_str()))
            .collect();
        ExtensionMapping::from_rows(&rows)
    }
}
