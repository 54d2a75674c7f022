//! Typed access to MongoDB collections.
//!
//! Collections opened through [`MongoClient::collection`] create their
//! schema's indexes up front and stamp [`Metadata`] on every insert, so
//! route handlers never manage timestamps or the soft-delete flag
//! themselves.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::{
    options::{IndexOptions, UpdateModifications},
    results::{DeleteResult, UpdateResult},
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use tracing::{error, info};

use crate::db::schemas::Metadata;
use crate::types::StartlinkError;

/// Indexes a schema wants created when its collection is opened.
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Exposes the embedded [`Metadata`] block so the wrapper can stamp it.
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// Shared handle to a MongoDB deployment and the database it serves.
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and ping, so an unreachable deployment fails at startup
    /// instead of on the first query.
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, StartlinkError> {
        info!("Connecting to MongoDB at {}", uri);

        // Cap server selection and connect time; the driver default hangs
        // for 30s on a dead host
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| StartlinkError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StartlinkError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Open a typed collection, creating its declared indexes.
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, StartlinkError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + Default + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

}

/// A collection whose documents carry [`Metadata`] and declare their indexes.
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + Default + IntoIndexes + MutMetadata,
{
    /// Open `collection_name` and make sure its indexes exist.
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, StartlinkError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Create the schema's indexes; a no-op when it declares none.
    async fn apply_indexes(&self) -> Result<(), StartlinkError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| StartlinkError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, stamping its creation metadata first.
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId, StartlinkError> {
        let metadata = item.mut_metadata();
        metadata.is_deleted = false;
        metadata.created_at = Some(DateTime::now());
        metadata.touch();

        let result = self
            .inner
            .insert_one(item)
            .await
            .map_err(|e| StartlinkError::Database(format!("Insert failed: {}", e)))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| StartlinkError::Database("Failed to get inserted ID".into()))
    }

    /// Fetch one live document matching `filter`.
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, StartlinkError> {
        // Soft-deleted documents never come back from reads
        let mut full_filter = filter;
        full_filter.insert("metadata.is_deleted", doc! { "$ne": true });

        self.inner
            .find_one(full_filter)
            .await
            .map_err(|e| StartlinkError::Database(format!("Find failed: {}", e)))
    }

    /// Fetch all live documents matching `filter`, in driver order.
    pub async fn find_many(&self, filter: Document) -> Result<Vec<T>, StartlinkError> {
        self.find_many_sorted(filter, None).await
    }

    /// Fetch all live documents matching `filter`, sorted when asked.
    pub async fn find_many_sorted(
        &self,
        filter: Document,
        sort: Option<Document>,
    ) -> Result<Vec<T>, StartlinkError> {
        use futures_util::StreamExt;

        // Same soft-delete screen as find_one
        let mut full_filter = filter;
        full_filter.insert("metadata.is_deleted", doc! { "$ne": true });

        let mut find = self.inner.find(full_filter);
        if let Some(sort_doc) = sort {
            find = find.sort(sort_doc);
        }

        let cursor = find
            .await
            .map_err(|e| StartlinkError::Database(format!("Find failed: {}", e)))?;

        let results: Vec<T> = cursor
            .filter_map(|doc| async {
                match doc {
                    Ok(d) => Some(d),
                    Err(e) => {
                        error!("Error reading document: {}", e);
                        None
                    }
                }
            })
            .collect()
            .await;

        Ok(results)
    }

    /// Apply an update to the first match. Returns the driver result so
    /// callers can turn `matched_count == 0` into a 404.
    pub async fn update_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult, StartlinkError> {
        let modifications = update.into();

        self.inner
            .update_one(filter, modifications)
            .await
            .map_err(|e| StartlinkError::Database(format!("Update failed: {}", e)))
    }

    /// Mark a document deleted without removing it. Reads stop returning
    /// it immediately.
    pub async fn soft_delete(&self, filter: Document) -> Result<UpdateResult, StartlinkError> {
        let update = doc! {
            "$set": {
                "metadata.is_deleted": true,
                "metadata.deleted_at": DateTime::now(),
                "metadata.updated_at": DateTime::now(),
            }
        };

        self.update_one(filter, update).await
    }

    /// Hard delete a document (used for filings, which are never soft-deleted)
    pub async fn delete_one(&self, filter: Document) -> Result<DeleteResult, StartlinkError> {
        self.inner
            .delete_one(filter)
            .await
            .map_err(|e| StartlinkError::Database(format!("Delete failed: {}", e)))
    }

}
