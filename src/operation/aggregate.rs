#[cfg(test)]
mod test;

use bson::{doc, Bson, Document};

use crate::cmap::Command;

/// Builds an `aggregate` command. `cursor: {}` is always present, per spec.md §4.4.
pub(crate) fn build_aggregate(collection: &str, target_db: &str, pipeline: Vec<Document>) -> Command {
    Command::new(
        "aggregate",
        target_db.to_string(),
        doc! {
            "aggregate": collection,
            "pipeline": pipeline.into_iter().map(Bson::Document).collect::<Vec<_>>(),
            "cursor": {},
        },
    )
}
