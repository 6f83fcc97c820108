//! Update splitting and document reconciliation for `get_and_update`

use mongodb::bson::{Bson, Document};

pub const PUSH_OPERATOR: &str = "$push";
pub const ADD_TO_SET_OPERATOR: &str = "$addToSet";
pub const INC_OPERATOR: &str = "$inc";
pub const SET_OPERATOR: &str = "$set";

/// Build the driver update from a partial document.
///
/// `$push` is sent as `$addToSet`, `$inc` is sent as `$inc` and every other
/// field goes into `$set`. Both operators are removed from `partial`, which
/// keeps only plain fields afterwards.
pub fn split_update(partial: &mut Document) -> Document {
    let mut update = Document::new();

    if let Some(push) = partial.remove(PUSH_OPERATOR) {
        update.insert(ADD_TO_SET_OPERATOR, push);
    }
    if let Some(inc) = partial.remove(INC_OPERATOR) {
        update.insert(INC_OPERATOR, inc);
    }
    if !partial.is_empty() {
        update.insert(SET_OPERATOR, Bson::Document(partial.clone()));
    }

    update
}

/// Fill the fields missing from `partial` with the values stored in `previous`.
///
/// Fields present in `partial` always win. The merge is shallow because `$set`
/// replaces top-level values whole. Key order follows `previous`, with fields
/// only present in `partial` appended.
pub fn merge_missing(previous: Document, partial: &Document) -> Document {
    let mut merged = previous;
    for (key, value) in partial {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_split_plain_fields_only() {
        let mut partial = doc! { "name": "ana", "age": 31 };
        let update = split_update(&mut partial);
        assert_eq!(update, doc! { "$set": { "name": "ana", "age": 31 } });
        assert_eq!(partial, doc! { "name": "ana", "age": 31 });
    }

    #[test]
    fn test_split_routes_operators() {
        let mut partial = doc! {
            "$push": { "tags": "new" },
            "$inc": { "visits": 1 },
            "name": "ana",
        };
        let update = split_update(&mut partial);

        assert_eq!(update.get_document("$addToSet").unwrap(), &doc! { "tags": "new" });
        assert_eq!(update.get_document("$inc").unwrap(), &doc! { "visits": 1 });
        assert_eq!(update.get_document("$set").unwrap(), &doc! { "name": "ana" });
        assert!(update.get("$push").is_none());
        assert_eq!(partial, doc! { "name": "ana" });
    }

    #[test]
    fn test_split_increment_without_set() {
        let mut partial = doc! { "$inc": { "visits": 2 } };
        let update = split_update(&mut partial);
        assert_eq!(update, doc! { "$inc": { "visits": 2 } });
        assert!(partial.is_empty());
    }

    #[test]
    fn test_merge_fills_missing_fields() {
        let previous = doc! { "_id": 1, "name": "ana", "age": 30, "city": "Lima" };
        let partial = doc! { "age": 31, "email": "ana@example.com" };

        let merged = merge_missing(previous, &partial);
        assert_eq!(
            merged,
            doc! {
                "_id": 1,
                "name": "ana",
                "age": 31,
                "city": "Lima",
                "email": "ana@example.com",
            }
        );
    }

    #[test]
    fn test_merge_is_shallow() {
        let previous = doc! { "address": { "city": "Lima", "zip": "15001" } };
        let partial = doc! { "address": { "city": "Cusco" } };

        let merged = merge_missing(previous, &partial);
        assert_eq!(merged, doc! { "address": { "city": "Cusco" } });
    }

    #[test]
    fn test_increment_with_plain_fields_reconciles_previous_state() {
        let mut partial = doc! { "$inc": { "visits": 1 }, "name": "bea" };
        let update = split_update(&mut partial);
        assert_eq!(update.get_document("$inc").unwrap(), &doc! { "visits": 1 });
        assert_eq!(update.get_document("$set").unwrap(), &doc! { "name": "bea" });

        let previous = doc! { "name": "ana", "visits": 4, "city": "Lima" };
        let merged = merge_missing(previous, &partial);
        assert_eq!(merged.get_str("name").unwrap(), "bea");
        assert_eq!(merged.get_i32("visits").unwrap(), 4);
        assert_eq!(merged.get_str("city").unwrap(), "Lima");
    }
}
