// Configuration loading
//
// Read from `<config dir>/tasklist/config.yaml`; every field is optional.

use crate::file::FileStore;
use crate::kv::{KeyValueStore, MemoryStore};
use crate::sqlite::SqliteStore;
use crate::store::DEFAULT_KEY;
use clap::ValueEnum;
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const APP_DIR: &str = "tasklist";
const CONFIG_FILE: &str = "config.yaml";
const SQLITE_FILE: &str = "tasklist.db";

/// Which key-value backend holds the task collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// One JSON file per key in the data directory
    #[default]
    File,
    /// SQLite database in the data directory
    Sqlite,
    /// Nothing survives the process
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the backend's files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub backend: BackendKind,

    /// Key the collection is stored under
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Minimum level written to stderr (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backend: BackendKind::default(),
            storage_key: default_storage_key(),
            log_level: default_log_level(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn default_storage_key() -> String {
    DEFAULT_KEY.to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load configuration
    ///
    /// An explicit `path` must exist. Without one the default location is
    /// tried and defaults are used if nothing is there.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml(&content).with_context(|| format!("Invalid config file {}", path.display()))?;
        info!(path = ?path, "Loaded config");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file parses as null rather than an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content).context("Failed to parse YAML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        crate::kv::validate_key(&self.storage_key)?;
        self.log_level
            .parse::<tracing::Level>()
            .map_err(|_| eyre!("Invalid log_level: {}", self.log_level))?;
        Ok(())
    }

    /// Open the configured backend
    pub fn open_backend(&self) -> Result<Box<dyn KeyValueStore>> {
        let backend: Box<dyn KeyValueStore> = match self.backend {
            BackendKind::File => Box::new(FileStore::open(&self.data_dir)?),
            BackendKind::Sqlite => Box::new(SqliteStore::open(self.data_dir.join(SQLITE_FILE))?),
            BackendKind::Memory => Box::new(MemoryStore::new()),
        };
        debug!(backend = ?self.backend, data_dir = ?self.data_dir, "Opened backend");
        Ok(backend)
    }
}
