//! A thread-per-connection blocking façade over the async [`crate::client::Client`], for
//! callers on the "blocking" scheduling model described in spec.md §5. Gated behind the `sync`
//! feature, mirroring the teacher's `sync` module layered on top of its async core.

use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use crate::{
    client::{Client as AsyncClient, ClientOptions},
    error::Result,
};

/// Owns a dedicated single-threaded Tokio runtime and blocks the calling thread on every
/// operation, so the suspension points of spec.md §5 ("connect, send, receive") are hidden
/// from callers who don't want to drive an executor themselves.
pub struct Client {
    runtime: Arc<Runtime>,
    inner: AsyncClient,
}

impl Client {
    pub fn connect(options: ClientOptions) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("failed to start the blocking client's runtime");
        let inner = runtime.block_on(AsyncClient::connect(options))?;
        Ok(Self {
            runtime: Arc::new(runtime),
            inner,
        })
    }

    pub fn database(&self, name: &str) -> Database {
        Database {
            runtime: self.runtime.clone(),
            inner: self.inner.database(name),
        }
    }

    pub fn is_replica_set(&self) -> Result<bool> {
        self.runtime.block_on(self.inner.is_replica_set())
    }

    pub fn close(self) {
        self.runtime.block_on(self.inner.close());
    }
}

/// The blocking equivalent of [`crate::db::Database`].
pub struct Database {
    runtime: Arc<Runtime>,
    inner: crate::db::Database,
}

impl Database {
    pub fn collection(&self, name: &str) -> Collection {
        Collection {
            runtime: self.runtime.clone(),
            inner: self.inner.collection(name),
        }
    }

    pub fn create_collection(&self, name: &str) -> Result<bool> {
        self.runtime.block_on(self.inner.create_collection(name))
    }

    pub fn drop(&self) -> Result<bool> {
        self.runtime.block_on(self.inner.drop())
    }
}

/// The blocking equivalent of [`crate::coll::Collection`]. Only `insert_one`/`find` are
/// exposed here; the full operation surface is available through [`AsyncClient`] for callers
/// who need it, matching the teacher's sync module scope (a thin convenience layer, not a
/// parallel API).
pub struct Collection {
    runtime: Arc<Runtime>,
    inner: crate::coll::Collection,
}

impl Collection {
    pub fn insert_one(&self, document: bson::Document) -> Result<crate::results::InsertOneResult> {
        self.runtime
            .block_on(self.inner.insert_one(document, Default::default()))
    }

    pub fn find(&self, filter: bson::Document) -> Result<crate::results::CursorResult> {
        self.runtime
            .block_on(self.inner.find(filter, Default::default()))
    }
}
