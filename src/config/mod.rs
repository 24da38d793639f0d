//! Configuration management for Hostkit

pub mod schema;

pub use schema::{CacheConfig, Config, GeneralConfig, RuntimeConfig};

use crate::error::{HostkitError, HostkitResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hostkit")
            .join("config.toml")
    }

    /// Platform cache directory for durable caches, if the platform has one
    pub fn default_cache_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|dir| dir.join("hostkit"))
    }

    /// Load configuration, using defaults if the file does not exist
    pub async fn load(&self) -> HostkitResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> HostkitResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| HostkitError::io(format!("reading config from {}", path.display()), e))?;

        let mut config: Config = toml::from_str(&content).map_err(|e| HostkitError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::resolve_cache(path, &mut config.cache).await?;
        Ok(config)
    }

    /// Check the `[cache]` section and anchor a relative directory at the
    /// config file's parent
    async fn resolve_cache(path: &Path, cache: &mut CacheConfig) -> HostkitResult<()> {
        let invalid = |reason: String| HostkitError::ConfigInvalid {
            path: path.to_path_buf(),
            reason,
        };

        let namespace = cache.namespace.as_str();
        if namespace.is_empty()
            || namespace == "."
            || namespace == ".."
            || namespace.contains(['/', '\\'])
        {
            return Err(invalid(format!(
                "cache.namespace '{}' must be a single path component",
                namespace
            )));
        }

        let Some(directory) = cache.directory.take() else {
            return Ok(());
        };
        if directory.as_os_str().is_empty() {
            return Ok(());
        }

        let directory = if directory.is_relative() {
            path.parent().unwrap_or(Path::new(".")).join(directory)
        } else {
            directory
        };

        match fs::metadata(&directory).await {
            Ok(meta) if !meta.is_dir() => {
                return Err(invalid(format!(
                    "cache.directory {} is not a directory",
                    directory.display()
                )));
            }
            Ok(_) => {}
            Err(_) => debug!("Cache directory {} will be created on first write", directory.display()),
        }

        cache.directory = Some(directory);
        Ok(())
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> HostkitResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            HostkitError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> HostkitResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| HostkitError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
