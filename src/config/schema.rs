//! Configuration schema for Hostkit
//!
//! Configuration is stored at `~/.config/hostkit/config.toml`

use crate::cache::{PersistenceMode, DEFAULT_NAMESPACE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Host runtime settings
    pub runtime: RuntimeConfig,

    /// Cache settings
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Host runtime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Runtime identifier tag
    pub name: String,

    /// Whether this host is a server runtime
    pub server: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            name: "server".to_string(),
            server: true,
        }
    }
}

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Keep entries across restarts
    pub persistent: bool,

    /// Durable cache directory (default: platform cache dir)
    pub directory: Option<PathBuf>,

    /// Store namespace entries are kept under
    pub namespace: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            persistent: false,
            directory: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl CacheConfig {
    pub fn persistence(&self) -> PersistenceMode {
        PersistenceMode::new(self.persistent, self.directory.clone())
    }
}
