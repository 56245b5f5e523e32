use async_trait::async_trait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, EntityTrait, TransactionTrait};
use sea_orm_migration::MigratorTrait;
use sea_query::OnConflict;
use serde_json::Value;
use tracing::{debug, info, instrument};
use crate::configuration::DatabaseSettings;
use crate::entity::collection::{self, ActiveModel as CollectionActiveModel, Entity as CollectionEntity};
use crate::migration::Migrator;
use super::{Batch, Collection, Storage, StorageError};

/// Durable storage keeping each collection as a JSON document row.
#[derive(Clone)]
pub struct DatabaseStorage {
    db: DatabaseConnection,
}

impl DatabaseStorage {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(settings))]
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, StorageError> {
        info!("Configuring database connection...");

        let mut options = ConnectOptions::new(settings.url.clone());
        options
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .connect_timeout(settings.connect_timeout)
            .acquire_timeout(settings.connect_timeout)
            .sqlx_logging(settings.sqlx_logging);

        let db = Database::connect(options).await?;
        info!("Database connected");

        Ok(Self::new(db))
    }

    /// Applies pending schema migrations.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        info!("Running database migrations...");
        Migrator::up(&self.db, None).await?;
        info!("Migrations complete");
        Ok(())
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl Storage for DatabaseStorage {
    async fn get(&self, collection: Collection) -> Result<Vec<Value>, StorageError> {
        let row = CollectionEntity::find_by_id(collection.key().to_string())
            .one(&self.db)
            .await?;

        match row {
            Some(row) => serde_json::from_str(&row.payload)
                .map_err(|source| StorageError::Corrupted { collection, source }),
            None => Ok(Vec::new()),
        }
    }

    async fn put_all(&self, batch: Batch) -> Result<(), StorageError> {
        let txn = self.db.begin().await?;

        for (collection, records) in batch {
            let payload = serde_json::to_string(&records)
                .map_err(|source| StorageError::Serialize { collection, source })?;

            CollectionEntity::insert(CollectionActiveModel::from_payload(collection.key(), payload))
                .on_conflict(
                    OnConflict::column(collection::Column::Name)
                        .update_columns([collection::Column::Payload, collection::Column::UpdatedAt])
                        .to_owned()
                )
                .exec_without_returning(&txn)
                .await?;

            debug!(collection = %collection, records = records.len(), "collection written");
        }

        // dropping an uncommitted transaction rolls it back
        txn.commit().await?;

        Ok(())
    }

    async fn clear(&self, collection: Collection) -> Result<(), StorageError> {
        CollectionEntity::delete_by_id(collection.key().to_string())
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
