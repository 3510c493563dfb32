//! Gradebook configuration.
//!
//! # Responsibility
//! - Load `[database]`, `[logging]` and `[grading]` settings from TOML.
//! - Fill omitted keys with defaults and reject unusable grading weights.

use crate::db::{open_db, DbError};
use crate::grading::MarksPolicy;
use crate::model::RecordValidationError;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = "gradebook";
const CONFIG_FILE_NAME: &str = "config.toml";
const DATABASE_FILE_NAME: &str = "gradebook.sqlite3";
const LOG_DIR_NAME: &str = "logs";

/// Errors raised while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(RecordValidationError),
    Database(DbError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "config path `{}` is not usable: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config TOML: {err}"),
            Self::Invalid(err) => write!(f, "invalid grading settings: {err}"),
            Self::Database(err) => write!(f, "failed to open configured database: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(err) => Some(err),
            Self::Database(err) => Some(err),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<DbError> for ConfigError {
    fn from(value: DbError) -> Self {
        Self::Database(value)
    }
}

impl From<RecordValidationError> for ConfigError {
    fn from(value: RecordValidationError) -> Self {
        Self::Invalid(value)
    }
}

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: GradebookConfig::config_dir().join(DATABASE_FILE_NAME),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            dir: GradebookConfig::config_dir().join(LOG_DIR_NAME),
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradebookConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub grading: MarksPolicy,
}

impl GradebookConfig {
    /// Per-user gradebook directory, e.g. `~/.config/gradebook` on Linux.
    ///
    /// Falls back to the home directory, then the temp directory, so the
    /// result is always absolute.
    #[must_use]
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(std::env::temp_dir)
            .join(CONFIG_DIR_NAME)
    }

    /// Default location of the config file.
    #[must_use]
    pub fn config_file_path() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE_NAME)
    }

    /// Parses a TOML document; omitted sections and keys take defaults.
    ///
    /// # Errors
    /// - `Parse` for malformed TOML or mistyped values.
    /// - `Invalid` when the grading weights fail `MarksPolicy::validate`.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.grading.validate()?;
        Ok(config)
    }

    /// Reads and parses the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Opens `[database] path`, creating its parent directory when missing.
    pub fn open_database(&self) -> Result<Connection, ConfigError> {
        let path = &self.database.path;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(open_db(path)?)
    }

    /// Loads `path` when it exists, otherwise returns defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
