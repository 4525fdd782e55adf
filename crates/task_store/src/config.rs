//! Store configuration and construction.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{JsonSnapshot, SnapshotTaskStore, SqliteTaskStore, TaskStore, TaskStoreResult};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Which durable backend a store uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Whole-file JSON snapshot with explicit save/load.
    #[default]
    Snapshot,
    /// SQLite table, committed per operation.
    Sqlite,
}

/// Store configuration: the backend to bind at construction and the data
/// file it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Selected backend.
    pub backend: BackendKind,
    /// Path of the snapshot file or database file.
    pub data_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::snapshot_default()
    }
}

impl StoreConfig {
    /// Returns the default data directory (~/.tasktrack/).
    fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tasktrack")
    }

    /// Snapshot-backed configuration at the default location.
    pub fn snapshot_default() -> Self {
        Self {
            backend: BackendKind::Snapshot,
            data_path: Self::default_data_dir().join("tasks.json"),
        }
    }

    /// SQLite-backed configuration at the default location.
    pub fn sqlite_default() -> Self {
        Self {
            backend: BackendKind::Sqlite,
            data_path: Self::default_data_dir().join("tasks.db"),
        }
    }

    /// Loads the configuration at `path`, falling back to defaults when no
    /// file exists there.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration to `path`.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Opens the store described by `config`. Backend selection happens here,
/// at construction; callers only ever hold the contract.
pub async fn open_store(config: &StoreConfig) -> TaskStoreResult<Box<dyn TaskStore>> {
    match config.backend {
        BackendKind::Snapshot => Ok(Box::new(
            SnapshotTaskStore::new(JsonSnapshot::new(&config.data_path)).await?,
        )),
        BackendKind::Sqlite => Ok(Box::new(SqliteTaskStore::open(&config.data_path).await?)),
    }
}
