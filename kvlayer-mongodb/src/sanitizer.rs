//! Field name escaping for MongoDB compatibility.
//!
//! Record values are arbitrary JSON, so objects stored under a key may carry
//! field names MongoDB rejects or interprets as operators. Field names are
//! escaped before they are written (and before they are used in a `$pull`, so
//! the stored and the compared forms agree) and restored when they are read
//! back. String values and record keys are stored as they are.

use bson::{Bson, Document};


/// Escapes and restores BSON field names to handle MongoDB field name restrictions.
///
/// MongoDB does not allow field names (document keys) to contain:
/// - Dots (`.`) - used for nested field access in queries
/// - Dollar signs (`$`) - used for operators in queries
/// - Null bytes (`\0`) - field name terminators
///
/// Escaping is percent-encoding of those characters and of `%` itself, so
/// every field name restores to exactly the name that was written.
pub(crate) struct ValueSanitizer;

impl ValueSanitizer {
    /// Character escapes; the escape character comes first.
    const ESCAPES: [(char, &'static str); 4] = [
        ('%', "%25"),
        ('.', "%2E"),
        ('$', "%24"),
        ('\0', "%00"),
    ];

    /// Recursively escapes the field names of every document inside a value.
    pub(crate) fn sanitize_value(value: &Bson) -> Bson {
        match value {
            Bson::Array(arr) => Bson::Array(
                arr
                    .iter()
                    .map(Self::sanitize_value)
                    .collect(),
            ),
            Bson::Document(doc) => Bson::Document(
                doc.iter()
                    .map(|(k, v)| (Self::sanitize_string(k), Self::sanitize_value(v)))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }

    /// Escapes a field or collection name.
    pub(crate) fn sanitize_string(input: &str) -> String {
        let mut sanitized = String::with_capacity(input.len());

        for c in input.chars() {
            match Self::ESCAPES.iter().find(|(target, _)| *target == c) {
                Some((_, escape)) => sanitized.push_str(escape),
                None => sanitized.push(c),
            }
        }

        sanitized
    }

    /// Recursively restores the field names of every document inside a value.
    pub(crate) fn restore_value(value: &Bson) -> Bson {
        match value {
            Bson::Array(arr) => Bson::Array(
                arr
                    .iter()
                    .map(Self::restore_value)
                    .collect(),
            ),
            Bson::Document(doc) => Bson::Document(Self::restore_document(doc)),
            _ => value.clone(),
        }
    }

    /// Restores every field name of a document, recursively.
    pub(crate) fn restore_document(doc: &Document) -> Document {
        doc.iter()
            .map(|(k, v)| (Self::restore_string(k), Self::restore_value(v)))
            .collect()
    }

    /// Reverts [`sanitize_string`](Self::sanitize_string).
    ///
    /// A `%` that does not start a known escape is kept as is.
    pub(crate) fn restore_string(input: &str) -> String {
        let mut restored = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(pos) = rest.find('%') {
            restored.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            match Self::ESCAPES.iter().find(|(_, escape)| tail.starts_with(escape)) {
                Some((target, escape)) => {
                    restored.push(*target);
                    rest = &tail[escape.len()..];
                }
                None => {
                    restored.push('%');
                    rest = &tail[1..];
                }
            }
        }

        restored.push_str(rest);
        restored
    }
}
