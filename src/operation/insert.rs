#[cfg(test)]
mod test;

use bson::{doc, Bson, Document};
use uuid::Uuid;

use crate::cmap::Command;

/// `insertMany` batches at this size by default (spec.md §4.4).
pub(crate) const INSERT_BATCH_SIZE: usize = 1000;

/// Ensures `doc` carries a non-empty `_id`, generating a UUID v7 string if it's missing or
/// empty, per spec.md §4.4's `insert` rule. Mutates `doc` in place and returns the id used.
pub(crate) fn normalize_id(doc: &mut Document) -> Bson {
    let needs_id = match doc.get("_id") {
        None => true,
        Some(Bson::String(s)) => s.is_empty(),
        Some(Bson::Null) => true,
        _ => false,
    };
    if needs_id {
        let id = Bson::String(Uuid::now_v7().to_string());
        doc.insert("_id", id.clone());
        id
    } else {
        doc.get("_id").cloned().unwrap()
    }
}

/// Builds one `insert` command for a single batch of already-`_id`-normalized documents.
pub(crate) fn build_insert_batch(
    collection: &str,
    target_db: &str,
    documents: Vec<Document>,
    ordered: bool,
) -> Command {
    Command::new(
        "insert",
        target_db.to_string(),
        doc! {
            "insert": collection,
            "documents": documents,
            "ordered": ordered,
        },
    )
}
