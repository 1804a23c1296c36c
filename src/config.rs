//! Plant configuration: JSON file plus environment overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::seed::DEFAULT_ADMIN;

/// Environment variable overriding [`PlantConfig::protected_username`].
pub const ENV_PROTECTED_USER: &str = "PLANTLOG_PROTECTED_USER";
/// Environment variable overriding [`PlantConfig::database_path`].
pub const ENV_DB: &str = "PLANTLOG_DB";
/// Environment variable overriding [`PlantConfig::undo_depth`].
pub const ENV_UNDO_DEPTH: &str = "PLANTLOG_UNDO_DEPTH";

/// Configuration load failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file is not valid JSON for [`PlantConfig`].
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// An environment override holds an unusable value.
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },
}

/// Settings the store needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Account that can never be deleted.
    pub protected_username: String,
    /// Undo snapshots kept; 0 disables undo.
    pub undo_depth: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            protected_username: DEFAULT_ADMIN.to_string(),
            undo_depth: 64,
        }
    }
}

/// Persistence behaviour of the session runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Save after every mutation instead of batching up to `save_max_latency_ms`.
    pub save_immediately: bool,
    /// Upper bound between a mutation and its snapshot save when batching.
    pub save_max_latency_ms: u64,
    /// Capacity of the queue feeding the persistence worker.
    pub persist_queue_bound: usize,
    /// Append audit ops to the gateway alongside snapshots.
    pub journal_ops: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            save_immediately: true,
            save_max_latency_ms: 75,
            persist_queue_bound: 64,
            journal_ops: true,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    /// Account that can never be deleted.
    pub protected_username: String,
    /// Undo snapshots kept; 0 disables undo.
    pub undo_depth: usize,
    /// SQLite file; `None` keeps everything in memory.
    pub database_path: Option<PathBuf>,
    /// Runtime persistence settings.
    pub runtime: RuntimeConfig,
}

impl Default for PlantConfig {
    fn default() -> Self {
        let store = StoreConfig::default();
        Self {
            protected_username: store.protected_username,
            undo_depth: store.undo_depth,
            database_path: None,
            runtime: RuntimeConfig::default(),
        }
    }
}

impl PlantConfig {
    /// Reads `path` (missing file means defaults) and applies process environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |var| std::env::var(var).ok())
    }

    /// Like [`PlantConfig::load`] with an injectable environment lookup.
    pub fn load_with_env(
        path: impl AsRef<Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            Self::default()
        };
        config.apply_env(env)?;
        Ok(config)
    }

    /// Overrides fields from `PLANTLOG_*` variables found through `env`.
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(user) = env(ENV_PROTECTED_USER).filter(|v| !v.trim().is_empty()) {
            self.protected_username = user.trim().to_string();
        }
        if let Some(db) = env(ENV_DB).filter(|v| !v.trim().is_empty()) {
            self.database_path = Some(PathBuf::from(db));
        }
        if let Some(depth) = env(ENV_UNDO_DEPTH) {
            self.undo_depth = depth.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_UNDO_DEPTH,
                value: depth,
            })?;
        }
        Ok(())
    }

    /// Store-facing subset.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            protected_username: self.protected_username.clone(),
            undo_depth: self.undo_depth,
        }
    }
}
