//! Cache adapter binding the cache contract to a host key/value store

use crate::cache::store::{FileStore, KvStore, MemoryStore};
use crate::cache::{Cache, CacheFactory, CacheValue, PersistenceMode};
use crate::config::ConfigManager;
use crate::error::{HostkitError, HostkitResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Logical store identifier entries are namespaced under
pub const DEFAULT_NAMESPACE: &str = "HostkitCache";

/// [`Cache`] implementation over any [`KvStore`]
///
/// The adapter exclusively owns its store handle. Store failures are
/// propagated, never turned into cache misses.
pub struct KvCache {
    store: Arc<dyn KvStore>,
    mode: PersistenceMode,
}

impl KvCache {
    pub fn new(store: Arc<dyn KvStore>, mode: PersistenceMode) -> Self {
        Self { store, mode }
    }

    /// An ephemeral cache over a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStore::new(DEFAULT_NAMESPACE)),
            PersistenceMode::ephemeral(),
        )
    }

    pub fn mode(&self) -> &PersistenceMode {
        &self.mode
    }

    /// Identifier of the backing store
    pub fn store_id(&self) -> &str {
        self.store.id()
    }
}

#[async_trait]
impl Cache for KvCache {
    async fn get(&self, key: &str) -> HostkitResult<Option<Vec<u8>>> {
        let value = self.store.get(key).await?;
        match &value {
            Some(bytes) => debug!("Cache hit {} ({} bytes)", key, bytes.len()),
            None => debug!("Cache miss {}", key),
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: CacheValue) -> HostkitResult<()> {
        let bytes = value.into_bytes()?;
        self.store.set(key, &bytes).await?;
        debug!("Cached {} ({} bytes)", key, bytes.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> HostkitResult<()> {
        self.store.delete(key).await?;
        debug!("Removed {}", key);
        Ok(())
    }

    fn cache_dir(&self) -> Option<&Path> {
        self.mode.cache_dir()
    }
}

/// Default [`CacheFactory`]: file-backed when durable, memory-backed otherwise
///
/// Ephemeral caches created by one factory share a single memory store, so
/// they see each other's entries like handles onto the same host engine.
pub struct KvCacheFactory {
    namespace: String,
    default_dir: Option<PathBuf>,
    memory: Arc<MemoryStore>,
}

impl KvCacheFactory {
    /// Create a factory for `namespace` using the platform cache directory
    /// for durable caches that don't name one
    pub fn new(namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            memory: Arc::new(MemoryStore::new(namespace.clone())),
            namespace,
            default_dir: ConfigManager::default_cache_dir(),
        }
    }

    /// Override the fallback directory for durable caches
    pub fn with_default_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.default_dir = dir;
        self
    }

    /// Use a specific memory store for ephemeral caches
    pub fn with_memory_store(mut self, store: Arc<MemoryStore>) -> Self {
        self.memory = store;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn resolve(&self, mode: PersistenceMode) -> HostkitResult<PersistenceMode> {
        if !mode.is_persistent() || mode.cache_dir().is_some() {
            return Ok(mode);
        }
        match &self.default_dir {
            Some(dir) => {
                debug!("Durable cache without directory, using {}", dir.display());
                Ok(PersistenceMode::durable(dir.clone()))
            }
            None => Err(HostkitError::unavailable(
                &self.namespace,
                "durable cache requested but no cache directory is available",
            )),
        }
    }
}

impl Default for KvCacheFactory {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

impl CacheFactory for KvCacheFactory {
    fn create(&self, mode: PersistenceMode) -> HostkitResult<Arc<dyn Cache>> {
        let mode = self.resolve(mode)?;
        let store: Arc<dyn KvStore> = match mode.cache_dir() {
            Some(dir) => Arc::new(FileStore::new(dir, &self.namespace)),
            None => self.memory.clone(),
        };
        debug!(
            "Created cache on store {} (persistent: {})",
            store.id(),
            mode.is_persistent()
        );
        Ok(Arc::new(KvCache::new(store, mode)))
    }
}
