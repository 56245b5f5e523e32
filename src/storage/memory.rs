use std::collections::{HashMap, HashSet};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;
use super::{Batch, Collection, Storage, StorageError};

#[derive(Default)]
struct MemoryStorageInner {
    collections: HashMap<Collection, Vec<Value>>,
    failing: HashSet<Collection>,
}

/// Process-local storage for tests and short-lived sessions.
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<MemoryStorageInner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write touching `collection` fail until cleared.
    pub async fn fail_writes_to(&self, collection: Collection) {
        self.inner.lock().await.failing.insert(collection);
    }

    pub async fn restore_writes(&self) {
        self.inner.lock().await.failing.clear();
    }

    /// Stores raw records, bypassing failure injection.
    pub async fn insert_raw(&self, collection: Collection, records: Vec<Value>) {
        self.inner.lock().await.collections.insert(collection, records);
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, collection: Collection) -> Result<Vec<Value>, StorageError> {
        let inner = self.inner.lock().await;
        Ok(inner.collections.get(&collection).cloned().unwrap_or_default())
    }

    async fn put_all(&self, batch: Batch) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;

        if let Some((collection, _)) = batch.iter().find(|(c, _)| inner.failing.contains(c)) {
            return Err(StorageError::Unavailable(format!("write to '{}' rejected", collection)));
        }

        for (collection, records) in batch {
            debug!(collection = %collection, records = records.len(), "collection written");
            inner.collections.insert(collection, records);
        }

        Ok(())
    }

    async fn clear(&self, collection: Collection) -> Result<(), StorageError> {
        self.inner.lock().await.collections.remove(&collection);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn missing_collection_reads_empty() {
        let storage = MemoryStorage::new();
        assert!(storage.get(Collection::Defects).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_batch_leaves_everything_untouched() {
        let storage = MemoryStorage::new();
        storage.put(Collection::Defects, vec![json!({ "id": "a" })]).await.unwrap();
        storage.fail_writes_to(Collection::Comments).await;

        let result = storage
            .put_all(vec![
                (Collection::Defects, vec![json!({ "id": "b" })]),
                (Collection::Comments, vec![json!({ "id": 1 })]),
            ])
            .await;

        assert!(matches!(result, Err(StorageError::Unavailable(_))));
        assert_eq!(storage.get(Collection::Defects).await.unwrap(), vec![json!({ "id": "a" })]);
        assert!(storage.get(Collection::Comments).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_removes_collection() {
        let storage = MemoryStorage::new();
        storage.put(Collection::Users, vec![json!({ "id": 1 })]).await.unwrap();
        storage.clear(Collection::Users).await.unwrap();
        assert!(storage.get(Collection::Users).await.unwrap().is_empty());
    }
}
