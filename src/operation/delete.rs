#[cfg(test)]
mod test;

use bson::{doc, Document};

use crate::cmap::Command;

pub(crate) fn build_delete(
    collection: &str,
    target_db: &str,
    filter: Document,
    multi: bool,
) -> Command {
    let limit = if multi { 0 } else { 1 };
    Command::new(
        "delete",
        target_db.to_string(),
        doc! {
            "delete": collection,
            "deletes": [ doc! { "q": filter, "limit": limit } ],
        },
    )
}
