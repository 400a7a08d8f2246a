#[cfg(test)]
mod test;

use bson::{doc, Bson, Document};

use crate::cmap::Command;

/// Coerces array-of-mapping values under `$and`/`$or`/`$nor` into BSON sub-documents, per
/// spec.md §4.4's `find` filter rule: a raw array stays an array, but an array element that is
/// itself a string-keyed mapping is distinguished as a document rather than passed through as
/// an opaque array value. `bson::to_bson` already produces `Bson::Document` for a Rust map
/// type, so this only matters when filters are assembled from a dynamic `Document` the caller
/// built by hand with array elements that look like documents.
fn normalize_logical_operators(filter: &mut Document) {
    for key in ["$and", "$or", "$nor"] {
        if let Ok(Bson::Array(arr)) = filter.get_array(key).map(|a| Bson::Array(a.clone())) {
            let coerced: Vec<Bson> = arr
                .into_iter()
                .map(|v| match v {
                    Bson::Document(mut d) => {
                        normalize_logical_operators(&mut d);
                        Bson::Document(d)
                    }
                    other => other,
                })
                .collect();
            filter.insert(key, coerced);
        }
    }
}

/// Builds a `find` command, per spec.md §4.4.
pub(crate) fn build_find(collection: &str, target_db: &str, mut filter: Document) -> Command {
    normalize_logical_operators(&mut filter);
    Command::new(
        "find",
        target_db.to_string(),
        doc! { "find": collection, "filter": filter },
    )
}
