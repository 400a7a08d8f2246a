#[cfg(test)]
mod test;

use bson::{doc, Bson, Document};

use crate::cmap::Command;

/// A single bulk-upsert operation entry (spec.md §4.4 `upsert`).
#[derive(Debug, Clone)]
pub struct UpsertOp {
    pub filter: Document,
    pub update: Document,
    pub multi: bool,
}

/// Builds a single-entry `update` command. `multi`/`upsert` are carried on the one update
/// document, matching the teacher's `{q, u, multi, upsert}` shape.
pub(crate) fn build_update(
    collection: &str,
    target_db: &str,
    filter: Document,
    update: Document,
    multi: bool,
    upsert: bool,
) -> Command {
    Command::new(
        "update",
        target_db.to_string(),
        doc! {
            "update": collection,
            "updates": [
                doc! { "q": filter, "u": update, "multi": multi, "upsert": upsert },
            ],
        },
    )
}

/// Builds a bulk `update` command where every entry is forced to `upsert: true`, per spec.md
/// §4.4's bulk `upsert` operation.
pub(crate) fn build_upsert_many(collection: &str, target_db: &str, ops: Vec<UpsertOp>) -> Command {
    let updates: Vec<Bson> = ops
        .into_iter()
        .map(|op| {
            Bson::Document(doc! {
                "q": op.filter,
                "u": op.update,
                "multi": op.multi,
                "upsert": true,
            })
        })
        .collect();

    Command::new(
        "update",
        target_db.to_string(),
        doc! { "update": collection, "updates": updates },
    )
}
