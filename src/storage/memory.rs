use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{validate_key, ObjectStore, StorageError};

/// Keeps objects in process memory. Clones share the same contents.
#[derive(Clone, Debug)]
pub struct InMemoryObjectStore {
    base_url: String,
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryObjectStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            objects: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().map(|objects| objects.contains_key(key)).unwrap_or(false)
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().ok().and_then(|objects| objects.get(key).cloned())
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, StorageError> {
        self.objects
            .lock()
            .map_err(|_| StorageError::Backend("object map poisoned".to_string()))
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new("memory://objects")
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        key: &str,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        validate_key(key)?;
        self.lock()?.insert(key.to_string(), bytes);
        Ok(format!("{}/{}", self.base_url, key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.lock()?.remove(key);
        Ok(())
    }
}
