use bson::doc;

use super::*;

#[test]
fn remove_and_new_flags_only_present_when_set() {
    let command = build_find_and_modify(
        "movies",
        "testing",
        doc! { "_id": 1 },
        None,
        FindAndModifyOptions {
            remove: true,
            ..Default::default()
        },
    );
    assert_eq!(command.body.get_bool("remove").unwrap(), true);
    assert!(!command.body.contains_key("new"));
    assert!(!command.body.contains_key("update"));
}
