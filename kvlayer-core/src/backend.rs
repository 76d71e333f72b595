//! Storage backend abstraction for the key-value layer.
//!
//! This module defines the traits that abstract over document databases, allowing
//! the key-value facade to work with different backends (in-memory, MongoDB, ...).
//!
//! # Overview
//!
//! The [`RecordBackend`] trait exposes the four single-document primitives the
//! facade is built from: find one record, find-and-update one record (optionally
//! upserting), find-and-delete one record, and list every record with pagination.
//! Implementations are required to be thread-safe (`Send + Sync`).
//!
//! # Traits
//!
//! - [`RecordBackend`]: The core trait for storage backends
//! - [`DynRecordBackend`]: A trait for dynamic dispatch over backend implementations
//! - [`RecordBackendBuilder`]: Factory trait for creating backend instances
//!
//! # Examples
//!
//! ```ignore
//! use kvlayer::backend::RecordBackend;
//! use kvlayer::filter::{Filter, Update, UpdateOptions};
//!
//! let backend = MyBackendImpl::new();
//!
//! backend
//!     .find_one_and_update(&Filter::key("name"), Update::Set("Alice".into()), UpdateOptions::upsert(), "core")
//!     .await?;
//! let document = backend.find_one(&Filter::key("name"), "core").await?;
//! ```

use async_trait::async_trait;
use bson::Document;
use std::fmt::Debug;

use crate::{
    error::StoreResult,
    filter::{Filter, ListOptions, Update, UpdateOptions},
};

/// Abstract interface for record storage backends.
///
/// Each method addresses a single collection by name and exchanges records as
/// BSON documents carrying the fields named in [`crate::record`]. Collections
/// are created on first write.
///
/// # Thread Safety
///
/// All implementations must be thread-safe and support concurrent access from
/// multiple async tasks. None of the methods is required to be atomic with
/// respect to the others: a find followed by an update may interleave with
/// other callers.
///
/// # Error Handling
///
/// Operations return [`StoreResult<T>`](crate::error::StoreResult). A missing
/// record is never an error; it is reported as `None`.
#[async_trait]
pub trait RecordBackend: Send + Sync + Debug {
    /// Returns the record matching `filter`, if any.
    async fn find_one(&self, filter: &Filter, collection: &str) -> StoreResult<Option<Document>>;

    /// Applies `update` to the record matching `filter` and returns the record
    /// as it is after the update.
    ///
    /// When no record matches, a new one is created if `options.upsert` is set
    /// (with its creation time stamped), otherwise `None` is returned.
    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: Update,
        options: UpdateOptions,
        collection: &str,
    ) -> StoreResult<Option<Document>>;

    /// Removes the record matching `filter` and returns it, if any.
    async fn find_one_and_delete(
        &self,
        filter: &Filter,
        collection: &str,
    ) -> StoreResult<Option<Document>>;

    /// Lists the records of a collection in the backend's natural order.
    async fn list_all(&self, options: ListOptions, collection: &str) -> StoreResult<Vec<Document>>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op, but backends holding external
    /// connections should override this.
    async fn shutdown(self) -> StoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> RecordBackend for &B
where
    B: RecordBackend,
{
    async fn find_one(&self, filter: &Filter, collection: &str) -> StoreResult<Option<Document>> {
        RecordBackend::find_one(*self, filter, collection).await
    }

    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: Update,
        options: UpdateOptions,
        collection: &str,
    ) -> StoreResult<Option<Document>> {
        RecordBackend::find_one_and_update(*self, filter, update, options, collection).await
    }

    async fn find_one_and_delete(
        &self,
        filter: &Filter,
        collection: &str,
    ) -> StoreResult<Option<Document>> {
        RecordBackend::find_one_and_delete(*self, filter, collection).await
    }

    async fn list_all(&self, options: ListOptions, collection: &str) -> StoreResult<Vec<Document>> {
        RecordBackend::list_all(*self, options, collection).await
    }
}

/// Object-safe twin of [`RecordBackend`] for runtime backend selection.
///
/// Every [`RecordBackend`] implements this trait, and `Box<dyn DynRecordBackend>`
/// implements [`RecordBackend`] in turn, so a boxed backend can be handed to
/// [`KeyValueStore`](crate::store::KeyValueStore) like any other.
#[async_trait]
pub trait DynRecordBackend: Send + Sync + Debug {
    async fn find_one(&self, filter: &Filter, collection: &str) -> StoreResult<Option<Document>>;
    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: Update,
        options: UpdateOptions,
        collection: &str,
    ) -> StoreResult<Option<Document>>;
    async fn find_one_and_delete(
        &self,
        filter: &Filter,
        collection: &str,
    ) -> StoreResult<Option<Document>>;
    async fn list_all(&self, options: ListOptions, collection: &str) -> StoreResult<Vec<Document>>;
    async fn shutdown_boxed(self: Box<Self>) -> StoreResult<()>;
}

#[async_trait]
impl<B: RecordBackend + 'static> DynRecordBackend for B {
    async fn find_one(&self, filter: &Filter, collection: &str) -> StoreResult<Option<Document>> {
        RecordBackend::find_one(self, filter, collection).await
    }

    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: Update,
        options: UpdateOptions,
        collection: &str,
    ) -> StoreResult<Option<Document>> {
        RecordBackend::find_one_and_update(self, filter, update, options, collection).await
    }

    async fn find_one_and_delete(
        &self,
        filter: &Filter,
        collection: &str,
    ) -> StoreResult<Option<Document>> {
        RecordBackend::find_one_and_delete(self, filter, collection).await
    }

    async fn list_all(&self, options: ListOptions, collection: &str) -> StoreResult<Vec<Document>> {
        RecordBackend::list_all(self, options, collection).await
    }

    async fn shutdown_boxed(self: Box<Self>) -> StoreResult<()> {
        RecordBackend::shutdown(*self).await
    }
}

#[async_trait]
impl RecordBackend for Box<dyn DynRecordBackend> {
    async fn find_one(&self, filter: &Filter, collection: &str) -> StoreResult<Option<Document>> {
        DynRecordBackend::find_one(&**self, filter, collection).await
    }

    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: Update,
        options: UpdateOptions,
        collection: &str,
    ) -> StoreResult<Option<Document>> {
        DynRecordBackend::find_one_and_update(&**self, filter, update, options, collection).await
    }

    async fn find_one_and_delete(
        &self,
        filter: &Filter,
        collection: &str,
    ) -> StoreResult<Option<Document>> {
        DynRecordBackend::find_one_and_delete(&**self, filter, collection).await
    }

    async fn list_all(&self, options: ListOptions, collection: &str) -> StoreResult<Vec<Document>> {
        DynRecordBackend::list_all(&**self, options, collection).await
    }

    async fn shutdown(self) -> StoreResult<()> {
        self.shutdown_boxed().await
    }
}

/// Factory for backends that need asynchronous setup, such as opening a connection.
#[async_trait]
pub trait RecordBackendBuilder {
    type Backend: RecordBackend;

    async fn build(self) -> StoreResult<Self::Backend>;
}
