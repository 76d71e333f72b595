//! Error types and result types for key-value operations.
//!
//! Errors come in two layers. Storage backends report [`StoreError`]; the
//! key-value facade reports [`KvError`], which wraps backend failures and adds
//! argument validation and value type mismatches.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors raised by a storage backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Serialization/deserialization error when converting between record formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during backend initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// A stored document does not have the shape of a record.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for storage backend operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<BsonError> for StoreError {
    fn from(err: BsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for StoreError {
    fn from(err: SerdeJsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Errors returned by [`KeyValueStore`](crate::store::KeyValueStore) operations.
///
/// Validation and type errors display as the bare message, e.g.
/// `key is required`. Backend failures display as the wrapped [`StoreError`].
#[derive(Error, Debug)]
pub enum KvError {
    /// A key or value argument is missing or has the wrong type.
    ///
    /// Raised before any backend call is made.
    #[error("{0}")]
    Validation(String),
    /// The stored value's type is incompatible with the requested operation,
    /// e.g. adding to a string or pushing onto a number.
    #[error("{0}")]
    Type(String),
    /// The storage backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl KvError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        KvError::Validation(message.into())
    }

    pub(crate) fn mismatch(message: impl Into<String>) -> Self {
        KvError::Type(message.into())
    }
}

/// A specialized `Result` type for key-value operations.
pub type KvResult<T> = Result<T, KvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_backend_messages_are_prefixed() {
        assert_eq!(KvError::validation("key is required").to_string(), "key is required");
        assert_eq!(KvError::mismatch("value must be an array").to_string(), "value must be an array");
        assert_eq!(
            KvError::from(StoreError::Backend("connection reset".into())).to_string(),
            "Backend error: connection reset",
        );
    }
}
