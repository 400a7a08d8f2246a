//! Collection-scoped CRUD and aggregation operations (spec.md §4.4).

use bson::{Bson, Document};

use crate::{
    client::Client,
    db::is_ok,
    error::{BulkWriteFailure, ErrorKind, Result, WriteError, WriteFailure},
    operation::{
        build_aggregate, build_count, build_create_indexes, build_delete, build_drop_collection,
        build_drop_indexes, build_find, build_find_and_modify, build_get_more, build_insert_batch,
        build_update, build_upsert_many, normalize_id, FindAndModifyOptions, IndexModel, UpsertOp,
        INSERT_BATCH_SIZE,
    },
    response::{cursor_batch, Interpreted},
    results::{
        CreateIndexesResult, CursorResult, DeleteResult, InsertManyResult, InsertOneResult,
        UpdateResult,
    },
};

/// Per-call options accepted by most collection operations: which session (if any) this
/// command runs on. Concern overrides are applied by the session coordinator for
/// transaction-scoped operations (spec.md §4.5) rather than per-call here.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationOptions<'a> {
    pub session: Option<&'a str>,
}

/// A handle to a single collection within a [`crate::db::Database`].
#[derive(Clone)]
pub struct Collection {
    client: Client,
    db_name: String,
    name: String,
}

impl Collection {
    pub(crate) fn new(client: Client, db_name: String, name: String) -> Self {
        Self {
            client,
            db_name,
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `insert(collection, document, options)`, per spec.md §4.4: generates a UUID v7 `_id` if
    /// missing/empty, wraps the single document in a one-element `documents` array.
    pub async fn insert_one(&self, mut document: Document, options: OperationOptions<'_>) -> Result<InsertOneResult> {
        let inserted_id = normalize_id(&mut document);
        let command = build_insert_batch(&self.name, &self.db_name, vec![document], true);
        self.client.run(command, options.session).await?;
        Ok(InsertOneResult { inserted_id })
    }

    /// `insertMany(collection, docs[], options)`: batches at [`INSERT_BATCH_SIZE`]. `ordered`
    /// defaults to true: the server stops at the first error in a batch and subsequent batches
    /// are not attempted, per spec.md §4.4. Any batch failure (ordered or not) is surfaced as a
    /// [`BulkWriteFailure`] carrying the indices that did commit and the errors for the ones
    /// that didn't, per spec.md §7.
    pub async fn insert_many(
        &self,
        mut documents: Vec<Document>,
        ordered: bool,
        options: OperationOptions<'_>,
    ) -> Result<InsertManyResult> {
        let inserted_ids: Vec<Bson> = documents.iter_mut().map(normalize_id).collect();
        let mut failure = BulkWriteFailure::default();

        for (batch_index, batch) in documents.chunks(INSERT_BATCH_SIZE).enumerate() {
            let batch_start = batch_index * INSERT_BATCH_SIZE;
            let command = build_insert_batch(&self.name, &self.db_name, batch.to_vec(), ordered);
            match self.client.run(command, options.session).await {
                Ok(_) => failure.inserted_indices.extend(batch_start..batch_start + batch.len()),
                Err(err) => {
                    if let ErrorKind::Write(WriteFailure::WriteConcernError(wce)) = err.kind() {
                        // The writes themselves applied; only the write concern went unsatisfied.
                        failure.inserted_indices.extend(batch_start..batch_start + batch.len());
                        failure.write_concern_error.get_or_insert_with(|| wce.clone());
                        continue;
                    }

                    failure.write_errors.push(WriteError {
                        index: batch_start,
                        code: err.code().unwrap_or(-1),
                        message: err.to_string(),
                    });
                    if ordered {
                        break;
                    }
                }
            }
        }

        if failure.write_errors.is_empty() && failure.write_concern_error.is_none() {
            Ok(InsertManyResult { inserted_ids })
        } else {
            Err(ErrorKind::BulkWrite(failure).into())
        }
    }

    /// `update(collection, filter, updates, options, multi?) → modified count`.
    pub async fn update(
        &self,
        filter: Document,
        update: Document,
        multi: bool,
        upsert: bool,
        options: OperationOptions<'_>,
    ) -> Result<UpdateResult> {
        let command = build_update(&self.name, &self.db_name, filter, update, multi, upsert);
        let interpreted = self.client.run(command, options.session).await?;
        Ok(UpdateResult {
            matched_count: count_of(&interpreted),
            modified_count: count_of(&interpreted),
            upserted_id: None,
        })
    }

    /// `upsert(collection, operations[]) → count`: bulk variant where every entry is forced
    /// `upsert: true`, per spec.md §4.4.
    pub async fn upsert_many(&self, ops: Vec<UpsertOp>, options: OperationOptions<'_>) -> Result<UpdateResult> {
        let command = build_upsert_many(&self.name, &self.db_name, ops);
        let interpreted = self.client.run(command, options.session).await?;
        Ok(UpdateResult {
            matched_count: count_of(&interpreted),
            modified_count: count_of(&interpreted),
            upserted_id: None,
        })
    }

    /// `find(collection, filter, options) → cursor response`.
    pub async fn find(&self, filter: Document, options: OperationOptions<'_>) -> Result<CursorResult> {
        let command = build_find(&self.name, &self.db_name, filter);
        let interpreted = self.client.run(command, options.session).await?;
        Ok(cursor_result(interpreted))
    }

    /// `aggregate(collection, pipeline, options) → cursor response`.
    pub async fn aggregate(&self, pipeline: Vec<Document>, options: OperationOptions<'_>) -> Result<CursorResult> {
        let command = build_aggregate(&self.name, &self.db_name, pipeline);
        let interpreted = self.client.run(command, options.session).await?;
        Ok(cursor_result(interpreted))
    }

    pub async fn find_and_modify(
        &self,
        filter: Document,
        update: Option<Document>,
        fam_options: FindAndModifyOptions,
        options: OperationOptions<'_>,
    ) -> Result<Option<Document>> {
        let command = build_find_and_modify(&self.name, &self.db_name, filter, update, fam_options);
        let interpreted = self.client.run(command, options.session).await?;
        Ok(match interpreted {
            Interpreted::Document(doc) => doc.get_document("value").ok().cloned(),
            _ => None,
        })
    }

    /// `getMore(cursorId, batchSize, options)`, continuing an open cursor.
    pub async fn get_more(&self, cursor_id: i64, batch_size: Option<i32>, options: OperationOptions<'_>) -> Result<CursorResult> {
        let body = build_get_more(cursor_id, &self.name, batch_size);
        let command = crate::cmap::Command::new("getMore", self.db_name.clone(), body);
        let interpreted = self.client.run(command, options.session).await?;
        Ok(cursor_result(interpreted))
    }

    /// `delete(collection, filter, multi?, options) → deleted count`.
    pub async fn delete(&self, filter: Document, multi: bool, options: OperationOptions<'_>) -> Result<DeleteResult> {
        let command = build_delete(&self.name, &self.db_name, filter, multi);
        let interpreted = self.client.run(command, options.session).await?;
        Ok(DeleteResult {
            deleted_count: count_of(&interpreted),
        })
    }

    /// `count(collection, filter, options) → count`. Per spec.md §9, a count command that
    /// fails because the collection doesn't exist is treated as zero results rather than
    /// propagated, matching the teacher's `count_documents` fallback for `NamespaceNotFound`.
    pub async fn count(&self, filter: Document, options: OperationOptions<'_>) -> Result<i64> {
        let command = build_count(&self.name, &self.db_name, filter);
        match self.client.run(command, options.session).await {
            Ok(interpreted) => Ok(count_of(&interpreted)),
            Err(err) if err.code() == Some(26) => Ok(0), // NamespaceNotFound
            Err(err) => Err(err),
        }
    }

    /// `createIndexes(collection, indexes[], options)`.
    pub async fn create_indexes(&self, indexes: Vec<IndexModel>, options: OperationOptions<'_>) -> Result<CreateIndexesResult> {
        let names = indexes
            .iter()
            .map(|m| m.name.clone().unwrap_or_else(|| "index".to_string()))
            .collect();
        let command = build_create_indexes(&self.name, &self.db_name, indexes);
        self.client.run(command, options.session).await?;
        Ok(CreateIndexesResult { index_names: names })
    }

    pub async fn drop_indexes(&self, index: &str, options: OperationOptions<'_>) -> Result<bool> {
        let command = build_drop_indexes(&self.name, &self.db_name, index);
        let interpreted = self.client.run(command, options.session).await?;
        Ok(is_ok(&interpreted))
    }

    pub async fn drop(&self, options: OperationOptions<'_>) -> Result<bool> {
        let command = build_drop_collection(&self.db_name, &self.name);
        let interpreted = self.client.run(command, options.session).await?;
        Ok(is_ok(&interpreted))
    }
}

fn count_of(interpreted: &Interpreted) -> i64 {
    match interpreted {
        Interpreted::Count(n) => *n,
        _ => 0,
    }
}

fn cursor_result(interpreted: Interpreted) -> CursorResult {
    match interpreted {
        Interpreted::Document(doc) => {
            let (cursor_id, namespace) = doc
                .get_document("cursor")
                .map(|c| {
                    (
                        c.get_i64("id").unwrap_or(0),
                        c.get_str("ns").ok().map(str::to_string),
                    )
                })
                .unwrap_or((0, None));
            CursorResult {
                first_batch: cursor_batch(&doc),
                cursor_id,
                namespace,
            }
        }
        Interpreted::FirstBatch(batch) => CursorResult {
            first_batch: batch,
            cursor_id: 0,
            namespace: None,
        },
        Interpreted::Count(_) => CursorResult::default(),
    }
}
