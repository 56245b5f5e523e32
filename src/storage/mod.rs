//! Key-value storage the lifecycle manager reads and writes through.
//!
//! Every collection is stored as one ordered sequence of JSON records. The
//! manager loads a whole collection, changes it in memory and writes it back,
//! so implementations only need `get`/`put` plus an atomic `put_all` for
//! operations that touch several collections at once.

pub mod database;
pub mod memory;

use std::fmt;
use async_trait::async_trait;
use sea_orm::DbErr;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use database::DatabaseStorage;
pub use memory::MemoryStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Defects,
    Comments,
    History,
    Projects,
    Users,
    Meta,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Defects,
        Collection::Comments,
        Collection::History,
        Collection::Projects,
        Collection::Users,
        Collection::Meta,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Collection::Defects => "defects",
            Collection::Comments => "comments",
            Collection::History => "history",
            Collection::Projects => "projects",
            Collection::Users => "users",
            Collection::Meta => "meta",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("collection '{collection}' holds unreadable data: {source}")]
    Corrupted {
        collection: Collection,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode records for '{collection}': {source}")]
    Serialize {
        collection: Collection,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A batch of whole-collection writes applied together.
pub type Batch = Vec<(Collection, Vec<Value>)>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Returns the records of a collection in insertion order; missing
    /// collections read as empty.
    async fn get(&self, collection: Collection) -> Result<Vec<Value>, StorageError>;

    async fn put(&self, collection: Collection, records: Vec<Value>) -> Result<(), StorageError> {
        self.put_all(vec![(collection, records)]).await
    }

    /// Writes every collection in the batch or none of them.
    async fn put_all(&self, batch: Batch) -> Result<(), StorageError>;

    async fn clear(&self, collection: Collection) -> Result<(), StorageError>;
}

/// Reads a collection and decodes every record.
pub async fn load<T: DeserializeOwned>(
    storage: &dyn Storage,
    collection: Collection,
) -> Result<Vec<T>, StorageError> {
    storage
        .get(collection)
        .await?
        .into_iter()
        .map(|record| {
            serde_json::from_value(record)
                .map_err(|source| StorageError::Corrupted { collection, source })
        })
        .collect()
}

pub fn encode<T: Serialize>(
    collection: Collection,
    records: &[T],
) -> Result<Vec<Value>, StorageError> {
    records
        .iter()
        .map(|record| {
            serde_json::to_value(record)
                .map_err(|source| StorageError::Serialize { collection, source })
        })
        .collect()
}
