use std::collections::HashSet;
use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{DateTime, Document, doc};
use mea::mutex::Mutex;
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, ReturnDocument},
};
use tracing::{debug, trace};
use kvlayer_core::{
    backend::{RecordBackend, RecordBackendBuilder},
    error::{StoreError, StoreResult},
    filter::{Filter, ListOptions, Update, UpdateOptions},
};

use crate::{
    sanitizer::ValueSanitizer,
    translate::{filter_document, find_options, key_index, update_document},
};


/// Record backend persisting each key as one document of a MongoDB collection.
///
/// Every collection gets a unique index on `key` the first time it is used, so
/// racing upserts of an absent key cannot insert two records for it.
#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
    indexed: Mutex<HashSet<String>>,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self {
            client,
            database,
            indexed: Mutex::new(HashSet::new()),
        }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(&ValueSanitizer::sanitize_string(collection_name))
    }

    /// Creates the unique `key` index of a collection unless this store already did.
    ///
    /// Creating an index that already exists is a no-op on the server.
    pub async fn ensure_indexes(&self, collection_name: &str) -> StoreResult<()> {
        let mut indexed = self.indexed.lock().await;

        if indexed.contains(collection_name) {
            return Ok(());
        }

        debug!(collection = collection_name, "creating unique key index");

        self.get_collection(collection_name)
            .create_index(key_index())
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        indexed.insert(collection_name.to_string());

        Ok(())
    }

    async fn collection(&self, collection_name: &str) -> StoreResult<MongoCollection<Document>> {
        self.ensure_indexes(collection_name).await?;

        Ok(self.get_collection(collection_name))
    }

    fn restore_document(&self, document: Document) -> Document {
        ValueSanitizer::restore_document(
            &document
                .into_iter()
                .filter(|(k, _)| k != "_id")
                .collect::<Document>(),
        )
    }
}

#[async_trait]
impl RecordBackend for MongoDbStore {
    async fn find_one(&self, filter: &Filter, collection: &str) -> StoreResult<Option<Document>> {
        trace!(key = filter.as_key(), collection, "find_one");

        Ok(
            self.get_collection(collection)
                .find_one(filter_document(filter))
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?
                .map(|doc| self.restore_document(doc))
        )
    }

    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: Update,
        options: UpdateOptions,
        collection: &str,
    ) -> StoreResult<Option<Document>> {
        trace!(key = filter.as_key(), collection, upsert = options.upsert, "find_one_and_update");

        Ok(
            self.collection(collection)
                .await?
                .find_one_and_update(
                    filter_document(filter),
                    update_document(&update, DateTime::now()),
                )
                .upsert(options.upsert)
                .return_document(ReturnDocument::After)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?
                .map(|doc| self.restore_document(doc))
        )
    }

    async fn find_one_and_delete(
        &self,
        filter: &Filter,
        collection: &str,
    ) -> StoreResult<Option<Document>> {
        trace!(key = filter.as_key(), collection, "find_one_and_delete");

        Ok(
            self.get_collection(collection)
                .find_one_and_delete(filter_document(filter))
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?
                .map(|doc| self.restore_document(doc))
        )
    }

    async fn list_all(&self, options: ListOptions, collection: &str) -> StoreResult<Vec<Document>> {
        trace!(collection, ?options, "list_all");

        Ok(
            self.get_collection(collection)
                .find(doc! {})
                .with_options(find_options(&options))
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?
                .try_collect::<Vec<Document>>()
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?
                .into_iter()
                .map(|doc| self.restore_document(doc))
                .collect()
        )
    }

    async fn shutdown(self) -> StoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl RecordBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> StoreResult<Self::Backend> {
        Ok(MongoDbStore::new(
            Client::with_options(
                ClientOptions::parse(&self.dsn)
                    .await
                    .map_err(|e| StoreError::Initialization(e.to_string()))?,
            )
            .map_err(|e| StoreError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}
