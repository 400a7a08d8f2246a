use bson::doc;

use crate::cmap::Command;

pub(crate) fn build_list_collections(target_db: &str, name: &str) -> Command {
    Command::new(
        "listCollections",
        target_db.to_string(),
        doc! { "listCollections": 1, "filter": { "name": name } },
    )
}

pub(crate) fn build_create_collection(target_db: &str, name: &str) -> Command {
    Command::new("create", target_db.to_string(), doc! { "create": name })
}

pub(crate) fn build_drop_collection(target_db: &str, name: &str) -> Command {
    Command::new("drop", target_db.to_string(), doc! { "drop": name })
}

pub(crate) fn build_drop_database(target_db: &str) -> Command {
    Command::new("dropDatabase", target_db.to_string(), doc! { "dropDatabase": 1 })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn list_collections_filters_by_name() {
        let command = build_list_collections("shop", "widgets");
        assert_eq!(command.name, "listCollections");
        assert_eq!(
            command.body.get_document("filter").unwrap().get_str("name").unwrap(),
            "widgets"
        );
    }

    #[test]
    fn drop_collection_and_drop_database_target_the_right_db() {
        let drop_coll = build_drop_collection("shop", "widgets");
        assert_eq!(drop_coll.target_db, "shop");
        assert_eq!(drop_coll.body.get_str("drop").unwrap(), "widgets");

        let drop_db = build_drop_database("shop");
        assert_eq!(drop_db.target_db, "shop");
        assert_eq!(drop_db.body.get_i32("dropDatabase").unwrap(), 1);
    }
}
