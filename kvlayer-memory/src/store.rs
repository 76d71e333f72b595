//! In-memory storage implementation for the key-value layer.
//!
//! This module provides a simple in-memory backend that stores records as BSON
//! documents in insertion-ordered lists guarded by async-safe read-write locks.

use std::{collections::HashMap, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Bson, DateTime, Document, doc};
use tracing::trace;

use kvlayer_core::{
    backend::{RecordBackend, RecordBackendBuilder},
    error::{StoreError, StoreResult},
    filter::{Filter, ListOptions, Update, UpdateOptions},
    record::{CREATED_AT_FIELD, KEY_FIELD, UPDATED_AT_FIELD, VALUE_FIELD},
};

use crate::evaluator::values_equal;

type CollectionRecords = Vec<Document>;
type StoreMap = HashMap<String, CollectionRecords>;


/// Thread-safe in-memory record storage backend.
///
/// This struct implements the [`RecordBackend`] trait entirely in memory.
/// Each collection is a list of record documents kept in insertion order, which
/// is also the order [`RecordBackend::list_all`] returns them in.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data.
///
/// # Performance
///
/// Lookups scan the collection (no indexing). This is fine for development and
/// tests; use a persistent backend like MongoDB for anything larger.
///
/// # Example
///
/// ```ignore
/// use kvlayer_memory::InMemoryStore;
/// use kvlayer_core::{backend::RecordBackend, filter::{Filter, Update, UpdateOptions}};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryStore::new();
///
///     store
///         .find_one_and_update(&Filter::key("a"), Update::Set(1.into()), UpdateOptions::upsert(), "core")
///         .await?;
///
///     assert!(store.find_one(&Filter::key("a"), "core").await?.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// The main storage map: collection_name -> records in insertion order
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    fn matches(document: &Document, filter: &Filter) -> bool {
        document
            .get_str(KEY_FIELD)
            .is_ok_and(|key| key == filter.as_key())
    }

    fn apply_update(document: &mut Document, update: Update, now: DateTime) -> StoreResult<()> {
        match update {
            Update::Set(value) => {
                document.insert(VALUE_FIELD, value);
            }
            Update::Pull(target) => match document.get_mut(VALUE_FIELD) {
                Some(Bson::Array(items)) => items.retain(|item| !values_equal(item, &target)),
                None | Some(Bson::Null) => {}
                Some(_) => {
                    return Err(StoreError::Backend(
                        "Cannot apply $pull to a non-array value".to_string(),
                    ));
                }
            },
        }

        document.insert(UPDATED_AT_FIELD, now);

        Ok(())
    }
}


#[async_trait]
impl RecordBackend for InMemoryStore {
    async fn find_one(&self, filter: &Filter, collection: &str) -> StoreResult<Option<Document>> {
        trace!(key = filter.as_key(), collection, "find_one");

        let store = self.store.read().await;

        Ok(
            store
                .get(collection)
                .and_then(|records| records.iter().find(|doc| Self::matches(doc, filter)))
                .cloned()
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

        let mut store = self.store.write().await;
        let now = DateTime::now();

        if let Some(records) = store.get_mut(collection) {
            if let Some(document) = records.iter_mut().find(|doc| Self::matches(doc, filter)) {
                Self::apply_update(document, update, now)?;

                return Ok(Some(document.clone()));
            }
        }

        if !options.upsert {
            return Ok(None);
        }

        let mut document = doc! {
            KEY_FIELD: filter.as_key(),
            CREATED_AT_FIELD: now,
        };
        Self::apply_update(&mut document, update, now)?;

        store
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());

        Ok(Some(document))
    }

    async fn find_one_and_delete(
        &self,
        filter: &Filter,
        collection: &str,
    ) -> StoreResult<Option<Document>> {
        trace!(key = filter.as_key(), collection, "find_one_and_delete");

        let mut store = self.store.write().await;
        let records = match store.get_mut(collection) {
            Some(records) => records,
            None => return Ok(None),
        };

        Ok(
            records
                .iter()
                .position(|doc| Self::matches(doc, filter))
                .map(|index| records.remove(index))
        )
    }

    async fn list_all(&self, options: ListOptions, collection: &str) -> StoreResult<Vec<Document>> {
        trace!(collection, ?options, "list_all");

        let store = self.store.read().await;
        let records = match store.get(collection) {
            Some(records) => records,
            None => return Ok(vec![]),
        };

        Ok(
            records
                .iter()
                .skip(options.skip.unwrap_or(0))
                .take(options.effective_limit().unwrap_or(usize::MAX))
                .cloned()
                .collect()
        )
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use kvlayer_memory::InMemoryStore;
/// use kvlayer_core::backend::RecordBackendBuilder;
///
/// #[tokio::main]
/// async fn main() {
///     let store = InMemoryStore::builder().build().await.unwrap();
/// }
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl RecordBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds and returns a new, empty [`InMemoryStore`].
    async fn build(self) -> StoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn set(store: &InMemoryStore, key: &str, value: impl Into<Bson>) -> Document {
        RecordBackend::find_one_and_update(
            store,
            &Filter::key(key),
            Update::Set(value.into()),
            UpdateOptions::upsert(),
            "core",
        )
        .await
        .unwrap()
        .unwrap()
    }

    #[tokio::test]
    async fn upsert_creates_then_replaces() {
        let store = InMemoryStore::new();

        let created = set(&store, "a", 1).await;
        assert_eq!(created.get_i32(VALUE_FIELD).unwrap(), 1);
        assert!(created.get_datetime(CREATED_AT_FIELD).is_ok());

        let updated = set(&store, "a", "two").await;
        assert_eq!(updated.get_str(VALUE_FIELD).unwrap(), "two");
        assert_eq!(
            updated.get_datetime(CREATED_AT_FIELD).unwrap(),
            created.get_datetime(CREATED_AT_FIELD).unwrap(),
        );

        let all = RecordBackend::list_all(&store, ListOptions::default(), "core").await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn update_without_upsert_skips_missing_records() {
        let store = InMemoryStore::new();

        let result = RecordBackend::find_one_and_update(
            &store,
            &Filter::key("missing"),
            Update::Set(1.into()),
            UpdateOptions::default(),
            "core",
        )
        .await
        .unwrap();

        assert!(result.is_none());
        assert!(RecordBackend::find_one(&store, &Filter::key("missing"), "core").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn pull_removes_all_equal_elements() {
        let store = InMemoryStore::new();
        set(&store, "list", bson::bson!(["a", 1, "b", 1.0, "a"])).await;

        let pulled = RecordBackend::find_one_and_update(
            &store,
            &Filter::key("list"),
            Update::Pull(Bson::Int64(1)),
            UpdateOptions::default(),
            "core",
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(pulled.get(VALUE_FIELD), Some(&bson::bson!(["a", "b", "a"])));
    }

    #[tokio::test]
    async fn pull_from_scalar_is_an_error() {
        let store = InMemoryStore::new();
        set(&store, "n", 3).await;

        let err = RecordBackend::find_one_and_update(
            &store,
            &Filter::key("n"),
            Update::Pull(3.into()),
            UpdateOptions::default(),
            "core",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[tokio::test]
    async fn list_all_keeps_insertion_order_and_paginates() {
        let store = InMemoryStore::new();
        for key in ["a", "b", "c", "d"] {
            set(&store, key, key).await;
        }

        let keys = |docs: Vec<Document>| {
            docs.iter()
                .map(|doc| doc.get_str(KEY_FIELD).unwrap().to_string())
                .collect::<Vec<_>>()
        };

        let page = RecordBackend::list_all(&store, ListOptions::new().skip(1).limit(2), "core").await.unwrap();
        assert_eq!(keys(page), ["b", "c"]);

        let unlimited = RecordBackend::list_all(&store, ListOptions::new().limit(0), "core").await.unwrap();
        assert_eq!(keys(unlimited), ["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn delete_returns_removed_record_and_collections_are_isolated() {
        let store = InMemoryStore::new();
        set(&store, "a", 1).await;

        assert!(RecordBackend::find_one_and_delete(&store, &Filter::key("a"), "other").await.unwrap().is_none());

        let removed = RecordBackend::find_one_and_delete(&store, &Filter::key("a"), "core").await.unwrap();
        assert_eq!(removed.unwrap().get_str(KEY_FIELD).unwrap(), "a");
        assert!(RecordBackend::find_one(&store, &Filter::key("a"), "core").await.unwrap().is_none());
    }
}
