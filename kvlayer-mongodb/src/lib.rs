//! MongoDB backend implementation for kvlayer.
//!
//! This crate provides a MongoDB-based implementation of the `RecordBackend` trait,
//! persisting records as MongoDB documents and delegating upserts, `$pull` updates
//! and pagination to the server.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! kvlayer = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use kvlayer::{prelude::*, mongodb::MongoDbStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = MongoDbStore::builder("mongodb://localhost:27017", "my_database")
//!         .build()
//!         .await?;
//!     let store = KeyValueStore::new(backend);
//!
//!     store.set("greeting", "hello").await?;
//!
//!     store.shutdown().await?;
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as kvlayer_mongodb;

pub mod store;
pub mod translate;
pub mod sanitizer;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
