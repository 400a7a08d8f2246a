use bson::doc;

use super::*;

#[test]
fn and_clause_array_of_mappings_stays_document_valued() {
    let filter = doc! {
        "$and": [
            { "price": { "$gt": 10 } },
            { "price": { "$lt": 100 } },
        ],
    };
    let command = build_find("movies", "testing", filter);
    let and = command
        .body
        .get_document("filter")
        .unwrap()
        .get_array("$and")
        .unwrap();
    assert!(and[0].as_document().is_some());
}

#[test]
fn find_command_carries_the_raw_filter() {
    let command = build_find("movies", "testing", doc! { "name": "Armageddon" });
    assert_eq!(command.body.get_str("find").unwrap(), "movies");
    assert_eq!(
        command.body.get_document("filter").unwrap(),
        &doc! { "name": "Armageddon" }
    );
}
