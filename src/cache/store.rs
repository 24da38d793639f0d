//! Host key/value stores backing the cache adapter
//!
//! A store maps string keys to binary values and owns its own internal
//! concurrency. Failures to reach the store surface as
//! [`HostkitError::AdapterUnavailable`]; a missing key is never an error.

use crate::error::{HostkitError, HostkitResult};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::trace;
use uuid::Uuid;

/// File names longer than this fall back to a hashed key
const MAX_FILE_STEM: usize = 200;

/// Key/value store handle supplied by the host runtime
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Logical store identifier (namespace)
    fn id(&self) -> &str;

    async fn get(&self, key: &str) -> HostkitResult<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: &[u8]) -> HostkitResult<()>;

    async fn delete(&self, key: &str) -> HostkitResult<()>;
}

/// In-process store for ephemeral caches
pub struct MemoryStore {
    id: String,
    entries: Option<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entries: Some(RwLock::new(HashMap::new())),
        }
    }

    /// A store whose engine never came up; every call fails
    pub fn unavailable(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entries: None,
        }
    }

    fn entries(&self) -> HostkitResult<&RwLock<HashMap<String, Vec<u8>>>> {
        self.entries
            .as_ref()
            .ok_or_else(|| HostkitError::unavailable(&self.id, "storage engine not initialized"))
    }

    /// Number of stored entries
    pub async fn len(&self) -> HostkitResult<usize> {
        Ok(self.entries()?.read().await.len())
    }

    pub async fn is_empty(&self) -> HostkitResult<bool> {
        Ok(self.len().await? == 0)
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    fn id(&self) -> &str {
        &self.id
    }

    async fn get(&self, key: &str) -> HostkitResult<Option<Vec<u8>>> {
        Ok(self.entries()?.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> HostkitResult<()> {
        self.entries()?
            .write()
            .await
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> HostkitResult<()> {
        self.entries()?.write().await.remove(key);
        Ok(())
    }
}

/// On-disk store for durable caches
///
/// Entries live at `<directory>/<namespace>/<hex(key)>.bin`. Writes go to a
/// temporary file first and are renamed into place.
pub struct FileStore {
    id: String,
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `directory/namespace`
    ///
    /// Nothing touches the filesystem until the first write.
    pub fn new(directory: &Path, namespace: &str) -> Self {
        Self {
            id: namespace.to_string(),
            root: directory.join(namespace),
        }
    }

    /// Directory holding this store's entries
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let mut stem = hex::encode(key.as_bytes());
        if stem.len() > MAX_FILE_STEM {
            stem = format!("h-{}", hex::encode(Sha256::digest(key.as_bytes())));
        }
        self.root.join(format!("{}.bin", stem))
    }

    fn unavailable(&self, action: &str, path: &Path, err: std::io::Error) -> HostkitError {
        HostkitError::unavailable(
            &self.id,
            format!("{} {}: {}", action, path.display(), err),
        )
    }

    async fn ensure_root(&self) -> HostkitResult<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| self.unavailable("creating", &self.root, e))?;

        // Set restrictive permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            fs::set_permissions(&self.root, perms)
                .await
                .map_err(|e| self.unavailable("setting permissions on", &self.root, e))?;
        }

        Ok(())
    }

    /// Write `value` to `tmp`, then move it over `path`
    async fn write_entry(&self, tmp: &Path, path: &Path, value: &[u8]) -> HostkitResult<()> {
        fs::write(tmp, value)
            .await
            .map_err(|e| self.unavailable("writing", tmp, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            fs::set_permissions(tmp, perms)
                .await
                .map_err(|e| self.unavailable("setting permissions on", tmp, e))?;
        }

        fs::rename(tmp, path)
            .await
            .map_err(|e| self.unavailable("replacing", path, e))
    }
}

#[async_trait]
impl KvStore for FileStore {
    fn id(&self) -> &str {
        &self.id
    }

    async fn get(&self, key: &str) -> HostkitResult<Option<Vec<u8>>> {
        let path = self.entry_path(key);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!("No entry file at {}", path.display());
                Ok(None)
            }
            Err(e) => Err(self.unavailable("reading", &path, e)),
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> HostkitResult<()> {
        self.ensure_root().await?;

        let path = self.entry_path(key);
        let tmp = self.root.join(format!(".{}.tmp", Uuid::new_v4()));

        let result = self.write_entry(&tmp, &path, value).await;
        if result.is_err() {
            let _ = fs::remove_file(&tmp).await;
        }
        result
    }

    async fn delete(&self, key: &str) -> HostkitResult<()> {
        let path = self.entry_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.unavailable("removing", &path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn memory_store_set_get_delete() {
        let store = MemoryStore::new("test");
        store.set("k", b"v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.len().await.unwrap(), 1);

        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn memory_store_unavailable_errors() {
        let store = MemoryStore::unavailable("offline");
        let err = store.get("k").await.unwrap_err();
        assert!(matches!(err, HostkitError::AdapterUnavailable { ref store, .. } if store == "offline"));
        assert!(store.set("k", b"v").await.is_err());
        assert!(store.delete("k").await.is_err());
    }

    #[tokio::test]
    async fn file_store_roundtrip_and_layout() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path(), "ns");

        store.set("player/js", b"payload").await.unwrap();
        assert_eq!(
            store.get("player/js").await.unwrap(),
            Some(b"payload".to_vec())
        );

        let expected = temp
            .path()
            .join("ns")
            .join(format!("{}.bin", hex::encode("player/js")));
        assert!(expected.exists());
    }

    #[tokio::test]
    async fn file_store_missing_key_is_absent() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path(), "ns");
        assert_eq!(store.get("nope").await.unwrap(), None);
        store.delete("nope").await.unwrap();
    }

    #[tokio::test]
    async fn file_store_long_keys_are_hashed() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path(), "ns");
        let key = "k".repeat(500);

        store.set(&key, b"x").await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(b"x".to_vec()));

        let name = store.entry_path(&key);
        let name = name.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("h-"));
    }

    #[tokio::test]
    async fn file_store_root_blocked_by_file_is_unavailable() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("ns"), b"not a dir").unwrap();
        let store = FileStore::new(temp.path(), "ns");

        let err = store.set("k", b"v").await.unwrap_err();
        assert!(matches!(err, HostkitError::AdapterUnavailable { .. }));
    }

    #[tokio::test]
    async fn file_store_failed_write_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path(), "ns");
        let key = "blocked";

        // A non-empty directory at the entry path makes the rename fail
        std::fs::create_dir_all(store.entry_path(key).join("child")).unwrap();

        let err = store.set(key, b"v").await.unwrap_err();
        assert!(matches!(err, HostkitError::AdapterUnavailable { .. }));

        let leftovers: Vec<_> = std::fs::read_dir(store.root())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_store_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path(), "ns");
        store.set("k", b"v").await.unwrap();

        let dir_mode = std::fs::metadata(store.root()).unwrap().permissions().mode();
        assert_eq!(dir_mode & 0o777, 0o700);
        let file_mode = std::fs::metadata(store.entry_path("k"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(file_mode & 0o777, 0o600);
    }
}
