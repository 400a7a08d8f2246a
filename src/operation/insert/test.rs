use bson::doc;
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn normalize_id_generates_uuid_v7_string_when_missing() {
    let mut doc = doc! { "name": "Armageddon" };
    let id = normalize_id(&mut doc);
    let Bson::String(s) = id else {
        panic!("expected a string _id")
    };
    assert_eq!(s.len(), 36);
    assert_eq!(doc.get_str("_id").unwrap().len(), 36);
}

#[test]
fn normalize_id_preserves_existing_non_empty_id() {
    let mut doc = doc! { "_id": 999i32, "name": "dup" };
    let id = normalize_id(&mut doc);
    assert_eq!(id, Bson::Int32(999));
    assert_eq!(doc.get_i32("_id").unwrap(), 999);
}

#[test]
fn normalize_id_replaces_empty_string_id() {
    let mut doc = doc! { "_id": "" };
    let id = normalize_id(&mut doc);
    assert_ne!(id, Bson::String(String::new()));
}

#[test]
fn build_insert_batch_sets_ordered_flag() {
    let command = build_insert_batch("movies", "testing", vec![doc! { "_id": 1 }], true);
    assert_eq!(command.body.get_bool("ordered").unwrap(), true);
    assert_eq!(command.body.get_str("insert").unwrap(), "movies");
}
