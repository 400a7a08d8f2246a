//! Database-scoped operations layered on top of [`Client`] (spec.md §4.4).

use bson::doc;

use crate::{
    client::Client,
    cmap::Command,
    coll::Collection,
    error::{Error, ErrorKind, Result},
    operation::{build_create_collection, build_drop_database, build_list_collections},
    response::{cursor_batch, Interpreted},
};

/// A handle to a single database on a connected [`Client`]. Cheap to clone: `Client` itself
/// shares its connection behind a mutex (spec.md §5).
#[derive(Clone)]
pub struct Database {
    client: Client,
    name: String,
}

impl Database {
    pub(crate) fn new(client: Client, name: String) -> Self {
        Self { client, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collection(&self, name: &str) -> Collection {
        Collection::new(self.client.clone(), self.name.clone(), name.to_string())
    }

    /// `createCollection`: fails with [`ErrorKind::AlreadyExists`] if a `listCollections` probe
    /// finds a matching name first, per spec.md §4.4.
    pub async fn create_collection(&self, name: &str) -> Result<bool> {
        let existing = batch_of(self.client.run(build_list_collections(&self.name, name), None).await?);
        if !existing.is_empty() {
            return Err(Error::new(ErrorKind::AlreadyExists {
                name: name.to_string(),
            }));
        }

        let interpreted = self.client.run(build_create_collection(&self.name, name), None).await?;
        Ok(is_ok(&interpreted))
    }

    pub async fn drop(&self) -> Result<bool> {
        let interpreted = self.client.run(build_drop_database(&self.name), None).await?;
        Ok(is_ok(&interpreted))
    }

    pub async fn list_collection_names(&self) -> Result<Vec<String>> {
        let command = Command::new(
            "listCollections",
            self.name.clone(),
            doc! { "listCollections": 1, "nameOnly": true },
        );
        let docs = batch_of(self.client.run(command, None).await?);
        Ok(docs
            .into_iter()
            .filter_map(|d| d.get_str("name").ok().map(str::to_string))
            .collect())
    }
}

fn batch_of(interpreted: Interpreted) -> Vec<bson::Document> {
    match interpreted {
        Interpreted::Document(doc) => cursor_batch(&doc),
        Interpreted::FirstBatch(batch) => batch,
        Interpreted::Count(_) => Vec::new(),
    }
}

/// `ok == 1.0` passthrough result, used by the plain boolean-returning commands (spec.md
/// §4.4's "plain passthroughs returning boolean success").
pub(crate) fn is_ok(interpreted: &Interpreted) -> bool {
    match interpreted {
        Interpreted::Document(doc) => doc.get_f64("ok").map(|ok| ok == 1.0).unwrap_or(false),
        Interpreted::Count(_) | Interpreted::FirstBatch(_) => true,
    }
}
