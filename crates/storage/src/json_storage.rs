//! JSON file storage implementation.
//!
//! Each key is stored as `<root>/<key>.json`, alongside a small meta marker
//! (`<root>/meta/<key>.meta.json`) holding a write counter and timestamp.
//! Writes go to a temporary file first and are renamed into place, so a crash
//! mid-write leaves the previous value readable.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use super::trait_::validate_key;
use super::{Result, Storage};

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Create storage rooted at `root`, creating the directory and its `meta/`
    /// subdirectory if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("meta")).await?;
        Ok(Self { root })
    }

    /// Directory holding the slots.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join("meta").join(format!("{}.meta.json", key))
    }

    /// Read and increment the per-key write counter, return the new value.
    async fn bump_version(&self, key: &str) -> Result<u64> {
        let path = self.meta_path(key);
        let mut version = 0u64;
        if let Ok(s) = fs::read_to_string(&path).await {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&s) {
                if let Some(v) = json.get("version").and_then(|v| v.as_u64()) {
                    version = v;
                }
            }
        }
        version += 1;
        let meta = serde_json::json!({"version": version, "updated_at": chrono::Utc::now()});
        fs::write(&path, serde_json::to_string_pretty(&meta)?.as_bytes()).await?;
        Ok(version)
    }

    /// Number of writes recorded for `key`, 0 if never written.
    pub async fn version(&self, key: &str) -> Result<u64> {
        validate_key(key)?;
        match fs::read_to_string(self.meta_path(key)).await {
            Ok(s) => {
                let json: serde_json::Value = serde_json::from_str(&s)?;
                Ok(json.get("version").and_then(|v| v.as_u64()).unwrap_or(0))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        match fs::read_to_string(self.slot_path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.slot_path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value.as_bytes()).await?;
        fs::rename(&tmp, &path).await?;

        let version = self.bump_version(key).await?;
        debug!("Wrote slot {} (version {})", key, version);
        Ok(())
    }

    async fn remove(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;
        for path in [self.slot_path(key), self.meta_path(key)] {
            fs::remove_file(&path).await.or_else(|e| {
                if e.kind() == std::io::ErrorKind::NotFound { Ok(()) } else { Err(e) }
            })?;
        }
        debug!("Removed slot {}", key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageError;

    #[tokio::test]
    async fn test_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();

        assert_eq!(storage.get("progress").await.unwrap(), None);

        storage.set("progress", r#"{"a":1}"#).await.unwrap();
        storage.set("progress", r#"{"a":2}"#).await.unwrap();
        assert_eq!(
            storage.get("progress").await.unwrap().as_deref(),
            Some(r#"{"a":2}"#)
        );
        assert_eq!(storage.version("progress").await.unwrap(), 2);
        assert!(dir.path().join("progress.json").exists());
        assert!(!dir.path().join("progress.json.tmp").exists());

        storage.remove("progress").await.unwrap();
        assert_eq!(storage.get("progress").await.unwrap(), None);
        assert_eq!(storage.version("progress").await.unwrap(), 0);

        // Removing twice is fine
        storage.remove("progress").await.unwrap();
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut storage = JsonStorage::new(dir.path()).await.unwrap();
            storage.set("slot", "hello").await.unwrap();
        }
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        assert_eq!(storage.get("slot").await.unwrap().as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();
        let err = storage.set("../escape", "x").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
