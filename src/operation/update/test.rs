use bson::doc;

use super::*;

#[test]
fn build_update_wraps_single_entry() {
    let command = build_update(
        "movies",
        "testing",
        doc! { "name": "Armageddon" },
        doc! { "$set": { "country": "USA" } },
        false,
        false,
    );
    let updates = command.body.get_array("updates").unwrap();
    assert_eq!(updates.len(), 1);
    let entry = updates[0].as_document().unwrap();
    assert_eq!(entry.get_bool("upsert").unwrap(), false);
}

#[test]
fn build_upsert_many_forces_upsert_true_on_every_entry() {
    let ops = vec![
        UpsertOp {
            filter: doc! { "name": "Gone with the wind" },
            update: doc! { "$set": { "country": "USA" }, "$inc": { "counter": 3 } },
            multi: false,
        },
        UpsertOp {
            filter: doc! { "name": "The godfather" },
            update: doc! { "$set": { "name": "The godfather 2" } },
            multi: false,
        },
    ];
    let command = build_upsert_many("movies_upsert", "testing", ops);
    let updates = command.body.get_array("updates").unwrap();
    assert_eq!(updates.len(), 2);
    for entry in updates {
        assert_eq!(entry.as_document().unwrap().get_bool("upsert").unwrap(), true);
    }
}
