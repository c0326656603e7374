//! In-memory [`RecordStore`] for dry runs and tests.
//!
//! Collections are `HashMap`s keyed by `file_path` behind a shared
//! `RwLock`, so every connection opened from the same [`InMemoryStore`]
//! sees the same data.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::AnalysisError;
use crate::models::FileAnalysisRecord;

use super::{CollectionStatus, RecordStore, StoreConnector};

type Collections = HashMap<String, HashMap<String, FileAnalysisRecord>>;

#[derive(Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<Collections>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in `collection`, sorted by `file_path`.
    pub fn records(&self, collection: &str) -> Vec<FileAnalysisRecord> {
        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());
        let mut records: Vec<_> = collections
            .get(collection)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default();
        records.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        records
    }

    pub fn has_collection(&self, collection: &str) -> bool {
        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());
        collections.contains_key(collection)
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn ensure_collection(&self, name: &str) -> Result<CollectionStatus, AnalysisError> {
        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
        if collections.contains_key(name) {
            return Ok(CollectionStatus::Existing);
        }
        collections.insert(name.to_string(), HashMap::new());
        Ok(CollectionStatus::Created)
    }

    async fn upsert_file_record(
        &self,
        collection: &str,
        record: &FileAnalysisRecord,
    ) -> Result<(), AnalysisError> {
        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(record.file_path.clone(), record.clone());
        Ok(())
    }

    async fn find_file_record(
        &self,
        collection: &str,
        file_path: &str,
    ) -> Result<Option<FileAnalysisRecord>, AnalysisError> {
        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());
        Ok(collections
            .get(collection)
            .and_then(|c| c.get(file_path))
            .cloned())
    }

    async fn close(&self) {}
}

#[async_trait]
impl StoreConnector for InMemoryStore {
    async fn connect(&self) -> Result<Box<dyn RecordStore>, AnalysisError> {
        Ok(Box::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, hash: &str, summary: &str) -> FileAnalysisRecord {
        FileAnalysisRecord {
            repo_url: "https://github.com/o/r".to_string(),
            file_path: path.to_string(),
            content_hash: hash.to_string(),
            summary: summary.to_string(),
        }
    }

    #[tokio::test]
    async fn test_ensure_collection_idempotent() {
        let store = InMemoryStore::new();
        assert_eq!(
            store.ensure_collection("files").await.unwrap(),
            CollectionStatus::Created
        );
        assert_eq!(
            store.ensure_collection("files").await.unwrap(),
            CollectionStatus::Existing
        );
        assert!(store.has_collection("files"));
    }

    #[tokio::test]
    async fn test_upsert_replaces_on_same_path() {
        let store = InMemoryStore::new();
        store.ensure_collection("files").await.unwrap();

        store
            .upsert_file_record("files", &record("a.py", "h1", "first"))
            .await
            .unwrap();
        store
            .upsert_file_record("files", &record("a.py", "h2", "second"))
            .await
            .unwrap();
        store
            .upsert_file_record("files", &record("b.py", "h3", "other"))
            .await
            .unwrap();

        let records = store.records("files");
        assert_eq!(records.len(), 2);
        let a = store.find_file_record("files", "a.py").await.unwrap().unwrap();
        assert_eq!(a.content_hash, "h2");
        assert_eq!(a.summary, "second");
    }

    #[tokio::test]
    async fn test_connections_share_data() {
        let store = InMemoryStore::new();
        let conn = store.connect().await.unwrap();
        conn.upsert_file_record("files", &record("a.py", "h", "s"))
            .await
            .unwrap();
        conn.close().await;

        assert_eq!(store.records("files").len(), 1);
        assert!(store
            .find_file_record("other", "a.py")
            .await
            .unwrap()
            .is_none());
    }
}
