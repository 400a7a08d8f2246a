use bson::{doc, Document};

use crate::cmap::Command;

pub(crate) fn build_count(collection: &str, target_db: &str, filter: Document) -> Command {
    Command::new(
        "count",
        target_db.to_string(),
        doc! { "count": collection, "query": filter },
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn count_wraps_filter_under_query() {
        let command = build_count("widgets", "shop", doc! { "color": "red" });
        assert_eq!(command.name, "count");
        assert_eq!(command.body.get_str("count").unwrap(), "widgets");
        assert_eq!(
            command.body.get_document("query").unwrap(),
            &doc! { "color": "red" }
        );
    }
}
