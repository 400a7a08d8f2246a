#[cfg(test)]
mod test;

use bson::{doc, Bson, Document};

use crate::cmap::Command;

/// A single index specification for `createIndexes` (spec.md §4.4).
#[derive(Debug, Clone)]
pub struct IndexModel {
    pub keys: Document,
    pub name: Option<String>,
    pub unique: bool,
    pub partial_filter_expression: Option<Document>,
}

/// Builds `createIndexes`. Preserves a legacy quirk (documented in spec.md §9): a `unique`
/// index with no `partialFilterExpression` also gets `sparse: true`, which is not how current
/// MongoDB versions require unique indexes to be declared but is retained for compatibility
/// with data written under the old behavior.
pub(crate) fn build_create_indexes(collection: &str, target_db: &str, indexes: Vec<IndexModel>) -> Command {
    let specs: Vec<Bson> = indexes
        .into_iter()
        .map(|model| {
            let mut spec = doc! { "key": model.keys.clone() };
            let name = model
                .name
                .clone()
                .unwrap_or_else(|| default_index_name(&model.keys));
            spec.insert("name", name);
            if model.unique {
                spec.insert("unique", true);
                if model.partial_filter_expression.is_none() {
                    spec.insert("sparse", true);
                }
            }
            if let Some(pfe) = model.partial_filter_expression {
                spec.insert("partialFilterExpression", pfe);
            }
            Bson::Document(spec)
        })
        .collect();

    Command::new(
        "createIndexes",
        target_db.to_string(),
        doc! { "createIndexes": collection, "indexes": specs },
    )
}

pub(crate) fn build_drop_indexes(collection: &str, target_db: &str, index: &str) -> Command {
    Command::new(
        "dropIndexes",
        target_db.to_string(),
        doc! { "dropIndexes": collection, "index": index },
    )
}

fn default_index_name(keys: &Document) -> String {
    keys.iter()
        .map(|(k, v)| format!("{k}_{v}"))
        .collect::<Vec<_>>()
        .join("_")
}
