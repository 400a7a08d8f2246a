use bson::doc;

use super::*;

#[test]
fn aggregate_always_includes_empty_cursor() {
    let command = build_aggregate("movies", "testing", vec![doc! { "$match": { "x": 1 } }]);
    assert_eq!(command.body.get_document("cursor").unwrap(), &Document::new());
    assert_eq!(command.body.get_array("pipeline").unwrap().len(), 1);
}
