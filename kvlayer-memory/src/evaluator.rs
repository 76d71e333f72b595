//! Value comparison for in-memory update evaluation.
//!
//! MongoDB compares numbers by value regardless of their BSON width, so an
//! `Int32(1)` pulled from an array also removes `Int64(1)` and `Double(1.0)`.
//! Embedded documents only match when their fields appear in the same order,
//! as with MongoDB's `$in`. This module reproduces that equality for BSON
//! values held in memory.

use bson::{Bson, datetime::DateTime};

/// Type-erased, comparable representation of BSON values.
///
/// Numeric types are normalized to f64 so values of different widths compare equal.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (all integers and floats normalized to f64)
    Number(f64),
    /// DateTime value
    DateTime(DateTime),
    /// String value
    String(&'a str),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values, in field order
    Map(Vec<(&'a str, Comparable<'a>)>),
    /// Any other BSON value, compared structurally
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect()
            ),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

/// Returns `true` when two BSON values are equal under MongoDB's matching rules.
pub(crate) fn values_equal(left: &Bson, right: &Bson) -> bool {
    Comparable::from(left) == Comparable::from(right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn numbers_compare_across_widths() {
        assert!(values_equal(&Bson::Int32(1), &Bson::Int64(1)));
        assert!(values_equal(&Bson::Int64(2), &Bson::Double(2.0)));
        assert!(!values_equal(&Bson::Int32(1), &Bson::String("1".into())));
    }

    #[test]
    fn documents_compare_by_content() {
        let left = Bson::Document(doc! { "a": 1, "b": [true, "x"] });
        let right = Bson::Document(doc! { "a": 1.0, "b": [true, "x"] });

        assert!(values_equal(&left, &right));
        assert!(!values_equal(&left, &Bson::Document(doc! { "a": 1 })));
    }

    #[test]
    fn documents_compare_in_field_order() {
        let left = Bson::Document(doc! { "a": 1, "b": 2 });
        let right = Bson::Document(doc! { "b": 2, "a": 1 });

        assert!(!values_equal(&left, &right));
    }
}
