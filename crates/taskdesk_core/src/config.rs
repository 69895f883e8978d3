//! Application configuration.
//!
//! # Responsibility
//! - Load storage backend selection and logging options from TOML.
//! - Build the configured `TaskStore` for the lifecycle service.
//!
//! # Invariants
//! - A missing config file yields defaults (`json` backend, `tasks.json`).
//! - Unreadable or malformed files are errors, never silently defaulted.

use crate::logging::default_log_level;
use crate::repo::json_store::JsonFileTaskStore;
use crate::repo::task_repo::{RepoResult, SqliteTaskStore, TaskStore};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const DEFAULT_JSON_FILE_NAME: &str = "tasks.json";
const DEFAULT_SQLITE_FILE_NAME: &str = "tasks.sqlite3";

/// Configuration load failure.
#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Persistence medium for tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Single pretty-printed JSON array file.
    #[default]
    Json,
    /// SQLite database with a `tasks` table.
    Sqlite,
}

impl StorageBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Sqlite => "sqlite",
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Data file; defaults per backend when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Returns the configured path or the backend's default file name.
    pub fn resolved_path(&self) -> PathBuf {
        match (&self.path, self.backend) {
            (Some(path), _) => path.clone(),
            (None, StorageBackend::Json) => PathBuf::from(DEFAULT_JSON_FILE_NAME),
            (None, StorageBackend::Sqlite) => PathBuf::from(DEFAULT_SQLITE_FILE_NAME),
        }
    }
}

/// `[logging]` section. Logging stays off unless `dir` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn effective_level(&self) -> &str {
        self.level.as_deref().unwrap_or(default_log_level())
    }
}

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from `path`, falling back to defaults when absent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("config path cannot be empty".to_string()));
        }

        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Parses configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        if let Some(path) = &config.storage.path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "storage.path cannot be empty".to_string(),
                ));
            }
        }
        Ok(config)
    }
}

/// Opens the task store selected by `config`.
pub fn open_store(config: &StorageConfig) -> RepoResult<Box<dyn TaskStore>> {
    let path = config.resolved_path();
    let store: Box<dyn TaskStore> = match config.backend {
        StorageBackend::Json => Box::new(JsonFileTaskStore::new(path)),
        StorageBackend::Sqlite => Box::new(SqliteTaskStore::open(path)?),
    };
    Ok(store)
}
