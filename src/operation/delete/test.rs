use bson::doc;

use super::*;

#[test]
fn single_delete_sets_limit_one() {
    let command = build_delete("movies", "testing", doc! { "_id": 1 }, false);
    let entry = &command.body.get_array("deletes").unwrap()[0];
    assert_eq!(entry.as_document().unwrap().get_i32("limit").unwrap(), 1);
}

#[test]
fn multi_delete_sets_limit_zero() {
    let command = build_delete("movies", "testing", doc! {}, true);
    let entry = &command.body.get_array("deletes").unwrap()[0];
    assert_eq!(entry.as_document().unwrap().get_i32("limit").unwrap(), 0);
}
