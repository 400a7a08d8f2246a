//! Result types returned from the high-level collection/database API (spec.md §4.4).

use bson::{Bson, Document};

use crate::concern::WriteConcernError;

/// The result of [`crate::coll::Collection::insert_one`].
#[derive(Debug, Clone)]
pub struct InsertOneResult {
    pub inserted_id: Bson,
}

/// The result of [`crate::coll::Collection::insert_many`].
#[derive(Debug, Clone, Default)]
pub struct InsertManyResult {
    pub inserted_ids: Vec<Bson>,
}

/// The result of [`crate::coll::Collection::update`]/`upsert`.
#[derive(Debug, Clone, Default)]
pub struct UpdateResult {
    pub matched_count: i64,
    pub modified_count: i64,
    pub upserted_id: Option<Bson>,
}

/// The result of [`crate::coll::Collection::delete`].
#[derive(Debug, Clone, Default)]
pub struct DeleteResult {
    pub deleted_count: i64,
}

/// The result of [`crate::coll::Collection::create_indexes`].
#[derive(Debug, Clone, Default)]
pub struct CreateIndexesResult {
    pub index_names: Vec<String>,
}

/// A partial success: some documents were written before a mid-batch failure, per spec.md
/// §4.4's `insertMany` ordered-batch semantics.
#[derive(Debug, Clone, Default)]
pub struct BulkWriteResult {
    pub inserted_count: i64,
    pub write_concern_error: Option<WriteConcernError>,
}

/// The raw server document backing a cursor-returning command (find/aggregate/getMore),
/// exposed verbatim since cursor iteration itself is out of scope (spec.md Non-goals).
#[derive(Debug, Clone, Default)]
pub struct CursorResult {
    pub first_batch: Vec<Document>,
    pub cursor_id: i64,
    pub namespace: Option<String>,
}
