//! Translation of kvlayer filters and updates into MongoDB documents.

use bson::{DateTime, Document, doc};
use mongodb::{
    IndexModel,
    options::{FindOptions, IndexOptions},
};

use kvlayer_core::{
    filter::{Filter, ListOptions, Update},
    record::{CREATED_AT_FIELD, KEY_FIELD, UPDATED_AT_FIELD, VALUE_FIELD},
};

use crate::sanitizer::ValueSanitizer;


/// Builds the query document selecting the record for a filter.
///
/// Keys are field values, not field names, so they are matched verbatim.
pub(crate) fn filter_document(filter: &Filter) -> Document {
    doc! { KEY_FIELD: filter.as_key() }
}

/// Builds the unique index on the record key.
pub(crate) fn key_index() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { KEY_FIELD: 1 })
        .options(
            IndexOptions::builder()
            .unique(true)
            .build()
        )
        .build()
}

/// Builds the cursor options for listing records.
///
/// Hints beyond what the driver accepts are clamped rather than wrapped.
pub(crate) fn find_options(options: &ListOptions) -> FindOptions {
    let mut find_options = FindOptions::default();

    if let Some(limit) = options.effective_limit() {
        find_options.limit = Some(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    if let Some(skip) = options.skip {
        find_options.skip = Some(u64::try_from(skip).unwrap_or(u64::MAX));
    }

    find_options
}

/// Builds the update document for an update applied at `now`.
///
/// `Set` also stamps the creation time when the update inserts the record.
/// `Pull` matches with `$in` so that object elements are compared by equality
/// instead of being read as a query condition.
pub(crate) fn update_document(update: &Update, now: DateTime) -> Document {
    match update {
        Update::Set(value) => {
            let value = ValueSanitizer::sanitize_value(value);

            doc! {
                "$set": { VALUE_FIELD: value, UPDATED_AT_FIELD: now },
                "$setOnInsert": { CREATED_AT_FIELD: now },
            }
        }
        Update::Pull(value) => {
            let target = ValueSanitizer::sanitize_value(value);

            doc! {
                "$pull": { VALUE_FIELD: { "$in": [target] } },
                "$set": { UPDATED_AT_FIELD: now },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::bson;

    #[test]
    fn filters_on_the_key_verbatim() {
        assert_eq!(filter_document(&Filter::key("user.name")), doc! { "key": "user.name" });
        assert_ne!(filter_document(&Filter::key("a.b")), filter_document(&Filter::key("a__dot__b")));
    }

    #[test]
    fn key_index_is_unique() {
        let index = key_index();

        assert_eq!(index.keys, doc! { "key": 1 });
        assert_eq!(index.options.and_then(|options| options.unique), Some(true));
    }

    #[test]
    fn listing_hints_never_go_negative() {
        let options = find_options(&ListOptions::new().limit(usize::MAX).skip(usize::MAX));

        assert_eq!(options.limit, Some(i64::MAX));
        assert_eq!(options.skip, Some(usize::MAX as u64));

        let unlimited = find_options(&ListOptions::new().limit(0).skip(2));
        assert_eq!(unlimited.limit, None);
        assert_eq!(unlimited.skip, Some(2));
    }

    #[test]
    fn set_escapes_field_names_but_not_strings() {
        let now = DateTime::now();
        let update = update_document(&Update::Set(bson!({ "a.b": "x.y" })), now);

        assert_eq!(
            update.get_document("$set").unwrap().get("value"),
            Some(&bson!({ "a%2Eb": "x.y" })),
        );
    }

    #[test]
    fn set_upserts_timestamps() {
        let now = DateTime::now();
        let update = update_document(&Update::Set(bson!({ "a": 1 })), now);

        assert_eq!(
            update,
            doc! {
                "$set": { "value": { "a": 1 }, "updatedAt": now },
                "$setOnInsert": { "createdAt": now },
            },
        );
    }

    #[test]
    fn pull_matches_by_equality() {
        let now = DateTime::now();
        let update = update_document(&Update::Pull(bson!({ "id": 7 })), now);

        assert_eq!(
            update,
            doc! {
                "$pull": { "value": { "$in": [{ "id": 7 }] } },
                "$set": { "updatedAt": now },
            },
        );
    }
}
