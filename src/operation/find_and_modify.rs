#[cfg(test)]
mod test;

use bson::{doc, Document};

use crate::cmap::Command;

/// Options accepted by `findAndModify` beyond filter/update (spec.md §4.4).
#[derive(Debug, Clone, Default)]
pub struct FindAndModifyOptions {
    pub sort: Option<Document>,
    pub remove: bool,
    pub upsert: bool,
    pub new: bool,
}

pub(crate) fn build_find_and_modify(
    collection: &str,
    target_db: &str,
    filter: Document,
    update: Option<Document>,
    options: FindAndModifyOptions,
) -> Command {
    let mut body = doc! { "findAndModify": collection, "query": filter };
    if let Some(update) = update {
        body.insert("update", update);
    }
    if let Some(sort) = options.sort {
        body.insert("sort", sort);
    }
    if options.remove {
        body.insert("remove", true);
    }
    if options.upsert {
        body.insert("upsert", true);
    }
    if options.new {
        body.insert("new", true);
    }
    Command::new("findAndModify", target_db.to_string(), body)
}
