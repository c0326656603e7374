//! MongoDB-backed [`RecordStore`].
//!
//! Each document holds `repoUrl`, `filePath`, `hash`, `summary`, and
//! `updatedAt`. Writes are `replaceOne({filePath}, doc, {upsert: true})`.
//! The connection string is only ever logged in redacted form.

use async_trait::async_trait;
use mongodb::bson::{doc, DateTime};
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::{Client, Collection, Database};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::AnalysisError;
use crate::models::FileAnalysisRecord;

use super::{CollectionStatus, RecordStore, StoreConnector};

/// Server error code for "collection already exists".
const NAMESPACE_EXISTS: i32 = 48;

#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    #[serde(flatten)]
    record: FileAnalysisRecord,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime>,
}

pub struct MongoConnector {
    config: StoreConfig,
}

impl MongoConnector {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl StoreConnector for MongoConnector {
    async fn connect(&self) -> Result<Box<dyn RecordStore>, AnalysisError> {
        let target = self.config.redacted_uri();
        info!(store = %target, database = %self.config.database, "connecting to document store");

        let unavailable = |e: MongoError| AnalysisError::StoreUnavailable {
            target: target.clone(),
            cause: e.to_string(),
        };

        let client = Client::with_uri_str(self.config.connection_uri())
            .await
            .map_err(unavailable)?;
        let database = client.database(&self.config.database);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(unavailable)?;

        Ok(Box::new(MongoStore {
            client,
            database,
            target,
        }))
    }
}

pub struct MongoStore {
    client: Client,
    database: Database,
    target: String,
}

impl MongoStore {
    fn collection(&self, name: &str) -> Collection<StoredRecord> {
        self.database.collection(name)
    }
}

fn is_namespace_exists(err: &MongoError) -> bool {
    matches!(err.kind.as_ref(), ErrorKind::Command(c) if c.code == NAMESPACE_EXISTS)
}

#[async_trait]
impl RecordStore for MongoStore {
    async fn ensure_collection(&self, name: &str) -> Result<CollectionStatus, AnalysisError> {
        let unavailable = |e: MongoError| AnalysisError::StoreUnavailable {
            target: self.target.clone(),
            cause: e.to_string(),
        };

        let existing = self
            .database
            .list_collection_names()
            .await
            .map_err(unavailable)?;
        if existing.iter().any(|n| n == name) {
            debug!(collection = name, "collection exists");
            return Ok(CollectionStatus::Existing);
        }

        match self.database.create_collection(name).await {
            Ok(()) => {
                info!(collection = name, "collection created");
                Ok(CollectionStatus::Created)
            }
            // Lost a race with another run creating it.
            Err(e) if is_namespace_exists(&e) => Ok(CollectionStatus::Existing),
            Err(e) => Err(unavailable(e)),
        }
    }

    async fn upsert_file_record(
        &self,
        collection: &str,
        record: &FileAnalysisRecord,
    ) -> Result<(), AnalysisError> {
        let stored = StoredRecord {
            record: record.clone(),
            updated_at: Some(DateTime::now()),
        };

        self.collection(collection)
            .replace_one(doc! { "filePath": record.file_path.as_str() }, &stored)
            .upsert(true)
            .await
            .map_err(|e| AnalysisError::StoreWriteError {
                file_path: record.file_path.clone(),
                cause: e.to_string(),
            })?;

        debug!(collection, file_path = %record.file_path, "record upserted");
        Ok(())
    }

    async fn find_file_record(
        &self,
        collection: &str,
        file_path: &str,
    ) -> Result<Option<FileAnalysisRecord>, AnalysisError> {
        let found = self
            .collection(collection)
            .find_one(doc! { "filePath": file_path })
            .await
            .map_err(|e| AnalysisError::StoreUnavailable {
                target: self.target.clone(),
                cause: e.to_string(),
            })?;
        Ok(found.map(|s| s.record))
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
        info!(store = %self.target, "document store connection closed");
    }
}
