//! Storage abstraction for analysis records.
//!
//! The [`StoreConnector`] trait opens one [`RecordStore`] per orchestration
//! run; the run closes it when it finishes, whether it succeeded or not.
//! Connections are never shared between runs.
//!
//! | Backend | Module | Used by |
//! |---------|--------|---------|
//! | MongoDB | [`mongo`] | `documenter serve`, `documenter analyse` |
//! | In-memory | [`memory`] | `documenter analyse --dry-run`, tests |
//!
//! Records are keyed by their raw file URL (`filePath`): an upsert fully
//! replaces any existing record with the same key.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;

use crate::error::AnalysisError;
use crate::models::FileAnalysisRecord;

pub use memory::InMemoryStore;
pub use mongo::MongoConnector;

/// Result of [`RecordStore::ensure_collection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    Existing,
    Created,
}

/// An open connection to a document store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create `name` unless it already exists. Idempotent.
    async fn ensure_collection(&self, name: &str) -> Result<CollectionStatus, AnalysisError>;

    /// Insert `record`, or replace the record with the same `file_path`.
    async fn upsert_file_record(
        &self,
        collection: &str,
        record: &FileAnalysisRecord,
    ) -> Result<(), AnalysisError>;

    /// Look up a record by its raw file URL.
    async fn find_file_record(
        &self,
        collection: &str,
        file_path: &str,
    ) -> Result<Option<FileAnalysisRecord>, AnalysisError>;

    /// Release the connection. Errors are logged, not returned.
    async fn close(&self);
}

/// Opens a fresh [`RecordStore`] connection.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn RecordStore>, AnalysisError>;
}
