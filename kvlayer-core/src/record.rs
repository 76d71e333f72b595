//! The stored unit of the key-value layer and its format conversions.
//!
//! A [`Record`] is a single document holding one key, its value and the
//! timestamps maintained by the backend. Backends exchange records as raw BSON
//! documents; this module converts between those documents, BSON values and
//! the JSON values the facade hands to callers.

use bson::{Bson, DateTime, Document, de::deserialize_from_bson, ser::serialize_to_bson};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// Name of the field holding the record key.
pub const KEY_FIELD: &str = "key";
/// Name of the field holding the record value.
pub const VALUE_FIELD: &str = "value";
/// Name of the field holding the creation timestamp.
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Name of the field holding the last update timestamp.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// A stored key/value pair.
///
/// The timestamps are written by the storage backend, never by the facade,
/// and may be missing on documents written by other tools.
///
/// # Example
///
/// ```ignore
/// let records = store.all(ListOptions::default()).await?;
///
/// for record in records {
///     println!("{} = {} (updated {:?})", record.key, record.value, record.updated_at());
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// The unique key of this record.
    pub key: String,
    /// The stored value.
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime>,
}

impl Record {
    /// Creates a record without timestamps.
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            created_at: None,
            updated_at: None,
        }
    }

    /// When the record was first written, if the backend recorded it.
    pub fn created_at(&self) -> Option<chrono::DateTime<Utc>> {
        self.created_at.map(|at| at.to_chrono())
    }

    /// When the record was last written, if the backend recorded it.
    pub fn updated_at(&self) -> Option<chrono::DateTime<Utc>> {
        self.updated_at.map(|at| at.to_chrono())
    }

    /// Decodes a record from a document returned by a backend.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidDocument`] if the document has no string `key`,
    /// or a serialization error if the value cannot be represented as JSON.
    pub fn from_document(document: Document) -> StoreResult<Self> {
        if document.get_str(KEY_FIELD).is_err() {
            return Err(StoreError::InvalidDocument(format!(
                "record is missing a string `{KEY_FIELD}` field"
            )));
        }

        Ok(deserialize_from_bson(Bson::Document(document))?)
    }
}

/// Converts a JSON value into the BSON form stored by backends.
///
/// # Errors
///
/// Returns an error for values BSON cannot hold, such as integers above `i64::MAX`.
pub fn json_to_bson(value: &Value) -> StoreResult<Bson> {
    Ok(serialize_to_bson(value)?)
}

/// Converts a stored BSON value back into JSON.
pub fn bson_to_json(value: Bson) -> StoreResult<Value> {
    Ok(deserialize_from_bson(value)?)
}
