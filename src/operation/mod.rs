//! Command builders for the high-level API (spec.md §4.4). Each function builds a verb-first
//! [`Command`], leaving session/concern injection to the caller (always applied immediately
//! before framing, per spec.md §4.5) and response interpretation to [`crate::response`].
//!
//! Unlike the teacher's `Operation`/`OperationWithDefaults` trait pair, these are plain
//! functions: there is no wire-version negotiation or topology-dependent command shape to
//! abstract over, since topology discovery is a non-goal here.

mod aggregate;
mod collections;
mod count;
mod delete;
mod find;
mod find_and_modify;
mod indexes;
mod insert;
mod transactions;
mod update;

pub(crate) use aggregate::build_aggregate;
pub(crate) use collections::{
    build_create_collection, build_drop_collection, build_drop_database, build_list_collections,
};
pub(crate) use count::build_count;
pub(crate) use delete::build_delete;
pub(crate) use find::build_find;
pub(crate) use find_and_modify::build_find_and_modify;
pub(crate) use indexes::{build_create_indexes, build_drop_indexes};
pub(crate) use insert::{build_insert_batch, normalize_id, INSERT_BATCH_SIZE};
pub(crate) use transactions::{build_abort_transaction, build_commit_transaction};
pub(crate) use update::{build_update, build_upsert_many};

pub use find_and_modify::FindAndModifyOptions;
pub use indexes::IndexModel;
pub use update::UpsertOp;

/// The default `getMore` batch size, mirrored from the teacher's cursor defaults.
pub(crate) const DEFAULT_BATCH_SIZE: i32 = 101;

pub(crate) fn build_get_more(cursor_id: i64, collection: &str, batch_size: Option<i32>) -> bson::Document {
    bson::doc! {
        "getMore": cursor_id,
        "collection": collection,
        "batchSize": batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
    }
}
