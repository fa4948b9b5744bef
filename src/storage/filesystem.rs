//! File System Key-Value Storage
//!
//! Information Hiding:
//! - File paths hidden from users
//! - Directory structure management hidden behind interface
//! - Persistence mechanism independent of storage trait users

use super::{KeyValueStore, StoreResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Each key is a file: `{base_path}/{key}.json`
pub struct FileKeyValueStore {
    base_path: PathBuf,
}

impl FileKeyValueStore {
    pub async fn new(base_path: PathBuf) -> StoreResult<Self> {
        fs::create_dir_all(&base_path).await?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.key_path(key);

        match fs::read_to_string(&path).await {
            Ok(value) => {
                tracing::debug!("[FileKeyValueStore] Read {} bytes from {:?}", value.len(), path);
                Ok(Some(value))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("[FileKeyValueStore] Key '{}' does not exist", key);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.key_path(key);
        fs::write(&path, value).await?;
        tracing::debug!("[FileKeyValueStore] Wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.key_path(key);

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("[FileKeyValueStore] Removed {:?}", path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(
                    "[FileKeyValueStore] Key '{}' does not exist, nothing to remove",
                    key
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_set_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp_dir.path().to_path_buf()).await.unwrap();

        store.set("chats", r#"[{"id":"1"}]"#).await.unwrap();
        let loaded = store.get("chats").await.unwrap();

        assert_eq!(loaded.as_deref(), Some(r#"[{"id":"1"}]"#));
        assert!(temp_dir.path().join("chats.json").exists());
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp_dir.path().to_path_buf()).await.unwrap();

        assert!(store.get("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp_dir.path().to_path_buf()).await.unwrap();

        store.set("chats", "[]").await.unwrap();
        store.remove("chats").await.unwrap();
        store.remove("chats").await.unwrap();

        assert!(!store.contains("chats").await.unwrap());
    }

    #[tokio::test]
    async fn test_creates_nested_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let store = FileKeyValueStore::new(nested.clone()).await.unwrap();

        assert!(nested.is_dir());
        assert_eq!(store.base_path(), nested.as_path());
    }

    #[tokio::test]
    async fn test_persistence_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().to_path_buf();

        {
            let store = FileKeyValueStore::new(path.clone()).await.unwrap();
            store.set("persist-test", "value").await.unwrap();
        }

        {
            let store = FileKeyValueStore::new(path).await.unwrap();
            let loaded = store.get("persist-test").await.unwrap();
            assert_eq!(loaded.as_deref(), Some("value"));
        }
    }
}
