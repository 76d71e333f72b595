//! Main kvlayer crate providing a key-value API over document stores.
//!
//! This crate is the primary entry point for users of kvlayer. It re-exports the
//! core types from the sub-crates and provides access to the storage backends.
//!
//! # Features
//!
//! - **Key-value semantics** - `get`/`set`/`delete`/`has`/`type_of` on JSON values
//! - **Numeric accumulation** - `add`/`sub` (and their `inc`/`dec` aliases)
//! - **Array mutation** - `push`/`pull`
//! - **Bulk listing** - `all`/`fetch_all` with limit and skip
//! - **Multiple backends** - In-memory and MongoDB storage behind one trait
//!
//! # Quick Start
//!
//! ```ignore
//! use kvlayer::{prelude::*, memory::InMemoryStore};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> KvResult<()> {
//!     let store = KeyValueStore::new(InMemoryStore::new());
//!
//!     store.set("user", json!({ "name": "Alice" })).await?;
//!     assert!(store.has("user").await?);
//!
//!     store.add("score", 10).await?;
//!     store.sub("score", 3).await?;
//!     assert_eq!(store.get("score").await?, Some(json!(7)));
//!
//!     store.push("tags", "admin").await?;
//!     store.pull("tags", "admin").await?;
//!
//!     for record in store.all(ListOptions::new().limit(10)).await? {
//!         println!("{} = {}", record.key, record.value);
//!     }
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! A store can be converted to one over a boxed backend when the backend type
//! is only known at runtime:
//!
//! ```ignore
//! let store: KeyValueStore<Box<dyn DynRecordBackend>> =
//!     KeyValueStore::new(InMemoryStore::new()).into_dyn();
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - `mongodb` - Persistent MongoDB backend (requires `mongodb` feature)

pub mod prelude;

/// Version of the kvlayer crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use kvlayer_core::{backend, error, filter, record, store, value};

// Re-export value types for convenience
pub use bson;
pub use serde_json;

/// In-memory storage backend implementations.
pub mod memory {
    pub use kvlayer_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use kvlayer_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
