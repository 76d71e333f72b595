//! Filters, updates and listing options understood by storage backends.
//!
//! The key-value layer only ever addresses a single record by its key, so the
//! vocabulary is deliberately small:
//!
//! - [`Filter`] - selects the record with a given key
//! - [`Update`] - replaces a record's value, or pulls elements out of an array value
//! - [`UpdateOptions`] - whether a missing record should be created
//! - [`ListOptions`] - pagination hints for listing every record
//!
//! # Example
//!
//! ```ignore
//! use kvlayer::filter::{Filter, Update, UpdateOptions};
//!
//! backend
//!     .find_one_and_update(
//!         &Filter::key("visits"),
//!         Update::Set(42.into()),
//!         UpdateOptions::upsert(),
//!         "core",
//!     )
//!     .await?;
//! ```

use bson::Bson;
use serde_json::Value;

use crate::error::{KvError, KvResult};

/// Selects the record stored under a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    key: String,
}

impl Filter {
    /// Creates a filter matching the record with the given key.
    pub fn key(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Returns the key this filter matches.
    pub fn as_key(&self) -> &str {
        &self.key
    }
}

/// A modification applied to the value of a single record.
///
/// Backends stamp the record's update time whenever an update is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Replaces the value entirely.
    Set(Bson),
    /// Removes every element of the array value equal to the given value.
    ///
    /// Applying this to a record whose value is not an array is a backend error;
    /// a record with no value is left untouched.
    Pull(Bson),
}

/// Options for [`RecordBackend::find_one_and_update`](crate::backend::RecordBackend::find_one_and_update).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Create the record when no record matches the filter.
    pub upsert: bool,
}

impl UpdateOptions {
    /// Options that create the record when it is missing.
    pub fn upsert() -> Self {
        Self { upsert: true }
    }
}

/// Pagination hints for listing every record of a collection.
///
/// A limit of zero means "no limit", as it does for MongoDB cursors.
///
/// # Example
///
/// ```ignore
/// let options = ListOptions::new().limit(10).skip(20);
/// let records = store.all(options).await?;
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Maximum number of records to return.
    pub limit: Option<usize>,
    /// Number of records to skip before returning any.
    pub skip: Option<usize>,
}

impl ListOptions {
    /// Creates options that list every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of records to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of records to skip.
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Returns the effective limit, treating zero as unlimited.
    pub fn effective_limit(&self) -> Option<usize> {
        self.limit.filter(|limit| *limit > 0)
    }

    fn parse_hint(options: &Value, name: &str) -> KvResult<Option<usize>> {
        match options.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => match n.as_u64() {
                Some(hint) => Ok(Some(usize::try_from(hint).unwrap_or(usize::MAX))),
                None => Err(KvError::validation(format!("{name} must be a number"))),
            },
            Some(_) => Err(KvError::validation(format!("{name} must be a number"))),
        }
    }
}

/// Parses loosely typed options such as `{"limit": 10, "skip": 5}`.
///
/// Missing or `null` hints are ignored; anything other than a non-negative
/// integer fails with [`KvError::Validation`].
impl TryFrom<Value> for ListOptions {
    type Error = KvError;

    fn try_from(options: Value) -> KvResult<Self> {
        if !(options.is_object() || options.is_null()) {
            return Err(KvError::validation("options must be an object"));
        }

        Ok(ListOptions {
            limit: Self::parse_hint(&options, "limit")?,
            skip: Self::parse_hint(&options, "skip")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_numeric_hints() {
        let options = ListOptions::try_from(json!({ "limit": 2, "skip": 1 })).unwrap();

        assert_eq!(options, ListOptions::new().limit(2).skip(1));
        assert_eq!(ListOptions::try_from(json!({})).unwrap(), ListOptions::default());
        assert_eq!(ListOptions::try_from(Value::Null).unwrap(), ListOptions::default());
    }

    #[test]
    fn rejects_non_numeric_hints() {
        let err = ListOptions::try_from(json!({ "limit": "x" })).unwrap_err();
        assert!(matches!(&err, KvError::Validation(msg) if msg == "limit must be a number"));

        let err = ListOptions::try_from(json!({ "skip": -1 })).unwrap_err();
        assert!(matches!(&err, KvError::Validation(msg) if msg == "skip must be a number"));

        assert!(ListOptions::try_from(json!([1, 2])).is_err());
    }

    #[test]
    fn oversized_hints_saturate() {
        let options = ListOptions::try_from(json!({ "limit": u64::MAX })).unwrap();

        assert_eq!(options.effective_limit(), Some(usize::MAX));
    }

    #[test]
    fn zero_limit_is_unlimited() {
        assert_eq!(ListOptions::new().limit(0).effective_limit(), None);
        assert_eq!(ListOptions::new().limit(3).effective_limit(), Some(3));
    }
}
