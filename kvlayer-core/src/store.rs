//! The key-value facade over a record backend.
//!
//! [`KeyValueStore`] validates arguments, translates key-value operations into
//! single-record backend calls and normalizes their results. It holds no data
//! of its own: every call goes straight to the backend.
//!
//! # Absent values
//!
//! Wherever an operation checks whether a key exists, a stored value that is
//! falsy (`null`, `false`, `0`, `""`, see [`is_truthy`]) counts as absent. So
//! `has` reports `false` for a stored `0`, `delete` leaves such a record alone,
//! and `add`/`push` overwrite it as if the key were new.
//!
//! # Concurrency
//!
//! Operations that read a value and then write it back (`delete`, `add`, `sub`,
//! `push`, `pull`) are not atomic by default: two concurrent `add` calls on the
//! same key may both read the same base value and one increment is lost.
//! Enable [`KeyValueStoreBuilder::serialize_keys`] to run those operations
//! under a per-key lock. The lock only coordinates callers sharing the same
//! `KeyValueStore`.
//!
//! # Example
//!
//! ```ignore
//! use kvlayer::{prelude::*, memory::InMemoryStore};
//! use serde_json::json;
//!
//! let store = KeyValueStore::builder(InMemoryStore::new())
//!     .collection("settings")
//!     .serialize_keys(true)
//!     .build();
//!
//! store.set("theme", json!({ "dark": true })).await?;
//! store.add("launches", 1).await?;
//! store.push("recent", "notes.md").await?;
//!
//! assert_eq!(store.type_of("theme").await?, Some(ValueType::Object));
//! ```

use serde::de::DeserializeOwned;
use serde_json::{Number, Value};
use std::future::Future;
use tracing::debug;

use crate::{
    backend::{DynRecordBackend, RecordBackend},
    error::{KvError, KvResult, StoreResult},
    filter::{Filter, ListOptions, Update, UpdateOptions},
    lock::KeyLocks,
    record::{Record, json_to_bson},
    value::{Accumulate, ValueType, is_truthy},
};

/// Collection used when none is configured.
pub const DEFAULT_COLLECTION: &str = "core";

/// Key-value API over a [`RecordBackend`].
///
/// Each instance addresses one collection of its backend. Several instances
/// can share a backend by reference (`KeyValueStore::new(&backend)`).
#[derive(Debug)]
pub struct KeyValueStore<B: RecordBackend> {
    backend: B,
    collection: String,
    locks: Option<KeyLocks>,
}

impl<B: RecordBackend> KeyValueStore<B> {
    /// Creates a store on the default collection without per-key locking.
    pub fn new(backend: B) -> Self {
        Self::builder(backend).build()
    }

    /// Creates a builder for configuring a store.
    pub fn builder(backend: B) -> KeyValueStoreBuilder<B> {
        KeyValueStoreBuilder::new(backend)
    }

    /// Returns the name of the collection records are stored in.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Stores `value` under `key`, replacing any existing value, and returns the
    /// value as read back from the backend.
    ///
    /// # Errors
    ///
    /// Fails with [`KvError::Validation`] when `key` is empty.
    pub async fn set(&self, key: &str, value: impl Into<Value>) -> KvResult<Option<Value>> {
        validate_key(key)?;
        debug!(key, collection = %self.collection, "set");

        self.write(key, &value.into()).await?;
        self.read(key).await
    }

    /// Returns the value stored under `key`, or `None` when there is no record.
    pub async fn get(&self, key: &str) -> KvResult<Option<Value>> {
        validate_key(key)?;
        debug!(key, collection = %self.collection, "get");

        self.read(key).await
    }

    /// Alias of [`get`](Self::get).
    pub async fn fetch(&self, key: &str) -> KvResult<Option<Value>> {
        self.get(key).await
    }

    /// Returns the value stored under `key` deserialized into `T`.
    ///
    /// # Errors
    ///
    /// Fails with [`KvError::Type`] when the stored value does not deserialize into `T`.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> KvResult<Option<T>> {
        self.get(key)
            .await?
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| KvError::mismatch(e.to_string()))
    }

    /// Returns `true` when `key` holds a truthy value.
    pub async fn has(&self, key: &str) -> KvResult<bool> {
        validate_key(key)?;
        debug!(key, collection = %self.collection, "has");

        Ok(self.present(key).await?.is_some())
    }

    /// Removes the record under `key`.
    ///
    /// Returns `false` without touching the backend when the key is absent.
    pub async fn delete(&self, key: &str) -> KvResult<bool> {
        validate_key(key)?;
        debug!(key, collection = %self.collection, "delete");

        self.exclusive(key, async {
            if self.present(key).await?.is_none() {
                return Ok(false);
            }

            self.backend
                .find_one_and_delete(&Filter::key(key), &self.collection)
                .await?;

            Ok(true)
        })
        .await
    }

    /// Returns the runtime type of the value under `key`, or `None` when absent.
    pub async fn type_of(&self, key: &str) -> KvResult<Option<ValueType>> {
        validate_key(key)?;
        debug!(key, collection = %self.collection, "type_of");

        Ok(self
            .present(key)
            .await?
            .as_ref()
            .and_then(ValueType::of))
    }

    /// Adds `value` to the number stored under `key` and returns the result.
    ///
    /// When the key is absent, `value` itself is stored.
    ///
    /// # Errors
    ///
    /// Fails with [`KvError::Validation`] when `value` is `null` or not a number,
    /// and with [`KvError::Type`] when the stored value is not a number.
    pub async fn add(&self, key: &str, value: impl Into<Value>) -> KvResult<Number> {
        self.accumulate(key, value.into(), Accumulate::Add).await
    }

    /// Subtracts `value` from the number stored under `key` and returns the result.
    ///
    /// When the key is absent, `value` itself is stored, not its negation.
    pub async fn sub(&self, key: &str, value: impl Into<Value>) -> KvResult<Number> {
        self.accumulate(key, value.into(), Accumulate::Sub).await
    }

    /// Alias of [`add`](Self::add).
    pub async fn inc(&self, key: &str, value: impl Into<Value>) -> KvResult<Number> {
        self.add(key, value).await
    }

    /// Alias of [`sub`](Self::sub).
    pub async fn dec(&self, key: &str, value: impl Into<Value>) -> KvResult<Number> {
        self.sub(key, value).await
    }

    /// Lists the records of the collection in the backend's order.
    pub async fn all(&self, options: ListOptions) -> KvResult<Vec<Record>> {
        debug!(collection = %self.collection, ?options, "all");

        Ok(self
            .backend
            .list_all(options, &self.collection)
            .await?
            .into_iter()
            .map(Record::from_document)
            .collect::<StoreResult<Vec<_>>>()?)
    }

    /// Alias of [`all`](Self::all).
    pub async fn fetch_all(&self, options: ListOptions) -> KvResult<Vec<Record>> {
        self.all(options).await
    }

    /// Appends `value` to the array stored under `key` and returns the array.
    ///
    /// An array `value` is appended element by element to an existing array,
    /// but is stored as a single element when the key is absent:
    /// pushing `["x", "y"]` to a new key yields `[["x", "y"]]`.
    ///
    /// # Errors
    ///
    /// Fails with [`KvError::Validation`] when `value` is `null`, and with
    /// [`KvError::Type`] when the stored value is not an array.
    pub async fn push(&self, key: &str, value: impl Into<Value>) -> KvResult<Vec<Value>> {
        validate_key(key)?;
        let value = validate_value(value.into())?;
        debug!(key, collection = %self.collection, "push");

        self.exclusive(key, async move {
            let items = match self.present(key).await? {
                None => vec![value],
                Some(Value::Array(mut items)) => {
                    match value {
                        Value::Array(values) => items.extend(values),
                        other => items.push(other),
                    }
                    items
                }
                Some(_) => return Err(KvError::mismatch("value must be an array")),
            };

            self.write(key, &Value::Array(items.clone())).await?;

            Ok(items)
        })
        .await
    }

    /// Removes every element equal to `value` (or to any element of `value`,
    /// when it is an array) from the array stored under `key`.
    ///
    /// Returns `None` when the key is absent. Array values are pulled one
    /// element at a time; a failure part way leaves earlier removals in place.
    ///
    /// # Errors
    ///
    /// Fails with [`KvError::Validation`] when `value` is `null`, and with
    /// [`KvError::Type`] when the stored value is not an array.
    pub async fn pull(&self, key: &str, value: impl Into<Value>) -> KvResult<Option<Vec<Value>>> {
        validate_key(key)?;
        let value = validate_value(value.into())?;
        debug!(key, collection = %self.collection, "pull");

        self.exclusive(key, async move {
            match self.present(key).await? {
                None => return Ok(None),
                Some(Value::Array(_)) => {}
                Some(_) => return Err(KvError::mismatch("value must be an array")),
            }

            let targets = match value {
                Value::Array(values) => values,
                other => vec![other],
            };

            for target in &targets {
                self.backend
                    .find_one_and_update(
                        &Filter::key(key),
                        Update::Pull(json_to_bson(target)?),
                        UpdateOptions::default(),
                        &self.collection,
                    )
                    .await?;
            }

            match self.read(key).await? {
                Some(Value::Array(items)) => Ok(Some(items)),
                Some(_) => Err(KvError::mismatch("value must be an array")),
                None => Ok(None),
            }
        })
        .await
    }

    /// Returns the number of records in the collection.
    pub async fn len(&self) -> KvResult<usize> {
        debug!(collection = %self.collection, "len");

        Ok(self
            .backend
            .list_all(ListOptions::default(), &self.collection)
            .await?
            .len())
    }

    /// Returns `true` when the collection holds no records.
    pub async fn is_empty(&self) -> KvResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Deletes every record of the collection and returns how many were removed.
    ///
    /// Unlike [`delete`](Self::delete), records holding falsy values are removed too.
    pub async fn clear(&self) -> KvResult<usize> {
        debug!(collection = %self.collection, "clear");

        let mut removed = 0;

        for record in self.all(ListOptions::default()).await? {
            if self
                .backend
                .find_one_and_delete(&Filter::key(record.key), &self.collection)
                .await?
                .is_some()
            {
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Converts this store into one backed by a boxed, dynamically dispatched backend.
    pub fn into_dyn(self) -> KeyValueStore<Box<dyn DynRecordBackend>>
    where
        B: 'static,
    {
        KeyValueStore {
            backend: Box::new(self.backend),
            collection: self.collection,
            locks: self.locks,
        }
    }

    /// Shuts down the store and releases backend resources.
    pub async fn shutdown(self) -> KvResult<()> {
        self.backend.shutdown().await?;

        Ok(())
    }

    async fn accumulate(&self, key: &str, delta: Value, op: Accumulate) -> KvResult<Number> {
        validate_key(key)?;
        let delta = match validate_value(delta)? {
            Value::Number(delta) => delta,
            _ => return Err(KvError::validation("value must be a number")),
        };
        debug!(key, collection = %self.collection, ?op, %delta, "accumulate");

        self.exclusive(key, async move {
            let next = match self.present(key).await? {
                None => delta,
                Some(Value::Number(current)) => op.apply(&current, &delta)?,
                Some(_) => return Err(KvError::mismatch("value must be a number")),
            };

            self.write(key, &Value::Number(next.clone())).await?;

            Ok(next)
        })
        .await
    }

    async fn exclusive<F, T>(&self, key: &str, operation: F) -> T
    where
        F: Future<Output = T>,
    {
        match &self.locks {
            Some(locks) => locks.run(key, operation).await,
            None => operation.await,
        }
    }

    async fn read(&self, key: &str) -> KvResult<Option<Value>> {
        let Some(document) = self
            .backend
            .find_one(&Filter::key(key), &self.collection)
            .await?
        else {
            return Ok(None);
        };

        let record = Record::from_document(document)?;

        Ok(Some(record.value).filter(|value| !value.is_null()))
    }

    async fn present(&self, key: &str) -> KvResult<Option<Value>> {
        Ok(self.read(key).await?.filter(is_truthy))
    }

    async fn write(&self, key: &str, value: &Value) -> KvResult<()> {
        self.backend
            .find_one_and_update(
                &Filter::key(key),
                Update::Set(json_to_bson(value)?),
                UpdateOptions::upsert(),
                &self.collection,
            )
            .await?;

        Ok(())
    }
}

/// Builder for [`KeyValueStore`].
///
/// # Example
///
/// ```ignore
/// let store = KeyValueStore::builder(backend)
///     .collection("sessions")
///     .serialize_keys(true)
///     .build();
/// ```
#[derive(Debug)]
pub struct KeyValueStoreBuilder<B: RecordBackend> {
    backend: B,
    collection: String,
    serialize_keys: bool,
}

impl<B: RecordBackend> KeyValueStoreBuilder<B> {
    /// Creates a builder using the default collection and no per-key locking.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            collection: DEFAULT_COLLECTION.to_string(),
            serialize_keys: false,
        }
    }

    /// Sets the collection records are stored in.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Runs read-modify-write operations under a per-key lock.
    pub fn serialize_keys(mut self, enabled: bool) -> Self {
        self.serialize_keys = enabled;
        self
    }

    /// Builds the store.
    pub fn build(self) -> KeyValueStore<B> {
        KeyValueStore {
            backend: self.backend,
            collection: self.collection,
            locks: self.serialize_keys.then(KeyLocks::new),
        }
    }
}

fn validate_key(key: &str) -> KvResult<()> {
    if key.is_empty() {
        return Err(KvError::validation("key is required"));
    }

    Ok(())
}

fn validate_value(value: Value) -> KvResult<Value> {
    if value.is_null() {
        return Err(KvError::validation("value is required"));
    }

    Ok(value)
}
