//! In-memory storage.
//!
//! Clones share the same slots, so a test can hand one clone to a tracker and
//! inspect what was written through another.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use super::trait_::validate_key;
use super::{Result, Storage, StorageError};

/// Volatile slot storage.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    slots: Arc<Mutex<HashMap<String, String>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`StorageError::Unavailable`],
    /// or recover when `false`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Current value of a slot, bypassing the availability switch.
    pub async fn peek(&self, key: &str) -> Option<String> {
        self.slots.lock().await.get(key).cloned()
    }

    /// Write a slot directly, bypassing the availability switch.
    pub async fn seed(&self, key: &str, value: &str) {
        self.slots
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable("storage switched off".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        self.check_available()?;
        Ok(self.slots.lock().await.get(key).cloned())
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.check_available()?;
        self.slots
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.check_available()?;
        self.slots.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_slots() {
        let observer = MemoryStorage::new();
        let mut writer = observer.clone();
        writer.set("k", "v").await.unwrap();
        assert_eq!(observer.peek("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_unavailable_switch() {
        let mut storage = MemoryStorage::new();
        storage.seed("k", "v").await;
        storage.set_unavailable(true);
        assert!(matches!(
            storage.get("k").await,
            Err(StorageError::Unavailable(_))
        ));
        assert!(storage.set("k", "w").await.is_err());
        assert_eq!(storage.peek("k").await.as_deref(), Some("v"));

        storage.set_unavailable(false);
        storage.remove("k").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap(), None);
    }
}
