//! Convenient re-exports of commonly used types from kvlayer.
//!
//! ```ignore
//! use kvlayer::prelude::*;
//! ```

pub use kvlayer_core::{
    store::{KeyValueStore, KeyValueStoreBuilder},
    record::Record,
    value::ValueType,
    backend::{RecordBackend, DynRecordBackend, RecordBackendBuilder},
    filter::{Filter, ListOptions, Update, UpdateOptions},
    error::{KvError, KvResult, StoreError, StoreResult},
};
