//! In-memory record storage backend for kvlayer.
//!
//! This crate provides a thread-safe, in-memory implementation of the `RecordBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is ideal for development
//! and testing.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Insertion order** - Records are listed in the order they were first written
//! - **MongoDB-like updates** - Upserts, timestamps and `$pull` equality semantics
//!
//! # Quick Start
//!
//! ```ignore
//! use kvlayer::{prelude::*, memory::InMemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder().build().await?;
//!     let store = KeyValueStore::new(backend);
//!
//!     store.set("name", "Alice").await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as kvlayer_memory;

pub mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
