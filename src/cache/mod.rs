//! Cache contract shared by every host runtime
//!
//! The contract stores raw bytes under string keys. Callers either hand over
//! bytes directly or a structured value, which is encoded as compact UTF-8
//! JSON with sorted object keys before it reaches the store.
//!
//! # Persistence
//!
//! | Mode | `cache_dir()` | Lifetime |
//! |------|---------------|----------|
//! | Ephemeral | `None` | Process only, may be dropped at any time |
//! | Durable | `Some(dir)` | Survives restart, namespaced under one store id |

pub mod adapter;
pub mod store;

pub use adapter::{KvCache, KvCacheFactory, DEFAULT_NAMESPACE};
pub use store::{FileStore, KvStore, MemoryStore};

use crate::error::HostkitResult;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Whether cache entries are expected to survive process restart
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistenceMode {
    persistent: bool,
    directory: Option<PathBuf>,
}

impl PersistenceMode {
    /// Create a mode from the raw flag and optional directory
    pub fn new(persistent: bool, directory: Option<PathBuf>) -> Self {
        Self {
            persistent,
            directory,
        }
    }

    /// Entries live for the process lifetime only
    pub fn ephemeral() -> Self {
        Self::default()
    }

    /// Entries persist on disk under `directory`
    pub fn durable(directory: impl Into<PathBuf>) -> Self {
        Self {
            persistent: true,
            directory: Some(directory.into()),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// The durable storage path, or `None` when not persistent
    ///
    /// A supplied directory is ignored while persistence is off.
    pub fn cache_dir(&self) -> Option<&Path> {
        if !self.persistent {
            return None;
        }
        self.directory
            .as_deref()
            .filter(|dir| !dir.as_os_str().is_empty())
    }
}

/// A value accepted by [`Cache::set`]
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    /// Stored as-is
    Binary(Vec<u8>),
    /// Encoded to canonical JSON bytes before storing
    Structured(serde_json::Value),
}

impl CacheValue {
    /// Build a structured value from anything serializable
    pub fn structured<T: Serialize + ?Sized>(value: &T) -> HostkitResult<Self> {
        Ok(Self::Structured(serde_json::to_value(value)?))
    }

    /// Encode to the bytes handed to the store
    pub fn into_bytes(self) -> HostkitResult<Vec<u8>> {
        match self {
            Self::Binary(bytes) => Ok(bytes),
            Self::Structured(value) => Ok(serde_json::to_vec(&canonicalize(value))?),
        }
    }
}

/// Rebuild every object with its keys in sorted order
///
/// `serde_json::Map` keeps insertion order when `preserve_order` is enabled
/// anywhere in the build, so the order is fixed here rather than relied on.
fn canonicalize(value: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, canonicalize(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

impl From<Vec<u8>> for CacheValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

impl From<&[u8]> for CacheValue {
    fn from(bytes: &[u8]) -> Self {
        Self::Binary(bytes.to_vec())
    }
}

impl From<serde_json::Value> for CacheValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Structured(value)
    }
}

/// Key/value cache used by the client library
///
/// Operations are individually atomic against the backing store. There are
/// no cross-key transactions and concurrent writes to one key are last-write-wins.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Fetch the payload for `key`; `Ok(None)` means absent, never an error
    async fn get(&self, key: &str) -> HostkitResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous payload
    async fn set(&self, key: &str, value: CacheValue) -> HostkitResult<()>;

    /// Delete `key`; absent keys are a no-op
    async fn remove(&self, key: &str) -> HostkitResult<()>;

    /// Advisory durable storage location, `None` unless persistent
    fn cache_dir(&self) -> Option<&Path>;
}

/// Constructs caches on demand with a caller-chosen persistence mode
pub trait CacheFactory: Send + Sync {
    fn create(&self, mode: PersistenceMode) -> HostkitResult<Arc<dyn Cache>>;
}

/// Typed JSON helpers available on every [`Cache`]
#[async_trait]
pub trait CacheExt: Cache {
    /// Fetch and decode a structured value
    async fn get_json<T>(&self, key: &str) -> HostkitResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Encode and store a structured value
    async fn set_json<T>(&self, key: &str, value: &T) -> HostkitResult<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let value = CacheValue::structured(value)?;
        self.set(key, value).await
    }
}

impl<C: Cache + ?Sized> CacheExt for C {}
