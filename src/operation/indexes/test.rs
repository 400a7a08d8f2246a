use bson::doc;

use super::*;

#[test]
fn unique_index_without_partial_filter_gets_sparse_quirk() {
    let command = build_create_indexes(
        "movies",
        "testing",
        vec![IndexModel {
            keys: doc! { "email": 1 },
            name: None,
            unique: true,
            partial_filter_expression: None,
        }],
    );
    let spec = command.body.get_array("indexes").unwrap()[0]
        .as_document()
        .unwrap();
    assert_eq!(spec.get_bool("sparse").unwrap(), true);
}

#[test]
fn unique_index_with_partial_filter_is_not_forced_sparse() {
    let command = build_create_indexes(
        "movies",
        "testing",
        vec![IndexModel {
            keys: doc! { "email": 1 },
            name: None,
            unique: true,
            partial_filter_expression: Some(doc! { "email": { "$exists": true } }),
        }],
    );
    let spec = command.body.get_array("indexes").unwrap()[0]
        .as_document()
        .unwrap();
    assert!(!spec.contains_key("sparse"));
}

#[test]
fn non_unique_index_never_gets_sparse() {
    let command = build_create_indexes(
        "movies",
        "testing",
        vec![IndexModel {
            keys: doc! { "name": 1 },
            name: None,
            unique: false,
            partial_filter_expression: None,
        }],
    );
    let spec = command.body.get_array("indexes").unwrap()[0]
        .as_document()
        .unwrap();
    assert!(!spec.contains_key("sparse"));
}
