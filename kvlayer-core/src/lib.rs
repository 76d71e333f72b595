//! A thin key-value layer over JSON document stores.
//!
//! This crate is the core of the kvlayer project and provides:
//!
//! - **Records** ([`record`]) - The stored key/value document and its BSON/JSON conversions
//! - **Values** ([`value`]) - Truthiness, runtime type names and numeric accumulation
//! - **Filters and updates** ([`filter`]) - The vocabulary spoken to storage backends
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing different storage backends
//! - **Key-value store** ([`store`]) - The key-value facade callers interact with
//! - **Error handling** ([`error`]) - Backend and facade error types
//!
//! # Example
//!
//! ```ignore
//! use kvlayer::{prelude::*, memory::InMemoryStore};
//!
//! let store = KeyValueStore::new(InMemoryStore::new());
//!
//! store.set("greeting", "hello world").await?;
//! assert_eq!(store.get("greeting").await?, Some("hello world".into()));
//!
//! store.add("visits", 1).await?;
//! store.push("tags", "rust").await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as kvlayer_core;

pub mod backend;
pub mod error;
pub mod filter;
pub mod record;
pub mod store;
pub mod value;

mod lock;
