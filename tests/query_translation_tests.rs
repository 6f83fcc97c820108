//! Query Translation Tests
//!
//! Query strings through the public API down to BSON filters and find options

use mgo_rs::{
    query::{translate_query, translate_query_str, FilterValue, SortOrder},
    CoercionKind, Error, FormatMap,
};
use mongodb::bson::doc;
use std::collections::HashMap;

#[test]
fn test_only_reserved_keys_yield_empty_predicates() {
    for query in [
        "sort=name",
        "limit=5",
        "offset=2",
        "skip=2",
        "sort=-a,b&limit=1&skip=0",
        r#"request-format={"a":"int"}&limit=3"#,
    ] {
        let filter = translate_query_str(query, None).unwrap();
        assert!(
            filter.predicates().is_empty(),
            "query {:?} produced predicates",
            query
        );
        assert!(filter.to_document().unwrap().is_empty());
    }
}

#[test]
fn test_sort_name_and_descending_age() {
    let filter = translate_query_str("sort=name,-age", None).unwrap();
    assert_eq!(filter.sort_document().unwrap(), doc! { "name": 1, "age": -1 });
}

#[test]
fn test_limit_and_offset() {
    let filter = translate_query_str("limit=10&offset=5", None).unwrap();
    assert_eq!(filter.pagination().limit, Some(10));
    assert_eq!(filter.pagination().skip, Some(5));

    let options = filter.find_options();
    assert_eq!(options.limit, Some(10));
    assert_eq!(options.skip, Some(5));
}

#[test]
fn test_non_numeric_pagination_is_a_parse_error() {
    for query in ["limit=abc", "offset=1x", "skip="] {
        match translate_query_str(query, None) {
            Err(Error::Parse { .. }) => {}
            other => panic!("query {:?}: expected parse error, got {:?}", query, other),
        }
    }
}

#[test]
fn test_typed_predicate_from_explicit_format() {
    let format = FormatMap::new().with("age", CoercionKind::Int);
    let filter = translate_query_str("age=30&name=ana", Some(&format)).unwrap();

    assert_eq!(filter.predicate("age"), Some(&FilterValue::Int(30)));
    assert_eq!(
        filter.to_document().unwrap(),
        doc! { "age": 30i64, "name": "ana" }
    );
}

#[test]
fn test_embedded_format_matches_explicit_format() {
    let embedded = translate_query(
        [("request-format", r#"{"age":"int"}"#), ("age", "30")],
        None,
    )
    .unwrap();

    let format = FormatMap::new().with("age", CoercionKind::Int);
    let explicit = translate_query([("age", "30")], Some(&format)).unwrap();

    assert_eq!(embedded, explicit);
}

#[test]
fn test_bad_embedded_format() {
    let err = translate_query_str("request-format=notjson&age=1", None).unwrap_err();
    assert!(matches!(err, Error::BadFormat(_)));
}

#[test]
fn test_repeated_sort_field_keeps_last_direction() {
    let filter = translate_query_str("sort=-name,age,name", None).unwrap();
    assert_eq!(filter.sort_order("name"), Some(SortOrder::Ascending));
    assert_eq!(filter.sort_order("age"), Some(SortOrder::Ascending));
}

#[test]
fn test_accepts_hashmap_params() {
    let mut params = HashMap::new();
    params.insert("active".to_string(), "false".to_string());
    params.insert("limit".to_string(), "20".to_string());

    let format = FormatMap::new().with("active", CoercionKind::Bool);
    let filter = translate_query(&params, Some(&format)).unwrap();

    assert_eq!(filter.predicate("active"), Some(&FilterValue::Bool(false)));
    assert_eq!(filter.pagination().limit, Some(20));
}

#[test]
fn test_coercion_error_names_field_and_value() {
    let format = FormatMap::new().with("score", CoercionKind::UInt);
    match translate_query_str("score=-4", Some(&format)) {
        Err(Error::Parse { field, value, .. }) => {
            assert_eq!(field, "score");
            assert_eq!(value, "-4");
        }
        other => panic!("expected parse error, got {:?}", other),
    }
}
