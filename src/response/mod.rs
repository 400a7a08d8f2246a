//! The Response Interpreter: the ordered checks spec.md §4.6 applies to every decoded command
//! reply, before any operation-specific parsing happens.

#[cfg(test)]
mod test;

use bson::{Bson, Document};

use crate::{
    client::session::CausalConsistencyTracker,
    error::{interpret_command_error, Error, Result},
};

/// What a successfully-interpreted response resolved to, per the ordered checks in spec.md
/// §4.6. Operation-layer code matches on this rather than re-deriving it from the raw document;
/// cursor-bearing commands (find/aggregate/getMore) get back a [`Interpreted::Document`] and
/// navigate `.cursor.firstBatch`/`.cursor.nextBatch` themselves, exactly as step 5 (not step 6)
/// of the ordered checks intends.
#[derive(Debug)]
pub(crate) enum Interpreted {
    /// Step 3: `n` present and `ok == 1.0`.
    Count(i64),
    /// Step 4/5: the whole response document (auth replies, and the generic `ok == 1.0` case,
    /// including cursor-bearing responses).
    Document(Document),
    /// Step 6: the fallback reached only when `ok != 1.0` yet the response still carries a
    /// cursor (legacy/edge-case servers); the cursor's first batch.
    FirstBatch(Vec<Document>),
}

/// Applies the six ordered checks of spec.md §4.6 to a decoded command reply, updating
/// `tracker` from any `operationTime`/`$clusterTime` fields present regardless of outcome.
pub(crate) fn interpret(response: Document, tracker: &mut CausalConsistencyTracker) -> Result<Interpreted> {
    tracker.record(&response);

    if let Some(kind) = interpret_command_error(&response) {
        return Err(Error::new(kind));
    }

    let ok = response
        .get_f64("ok")
        .or_else(|_| response.get_i32("ok").map(f64::from))
        .unwrap_or(0.0);

    if ok == 1.0 {
        if let Ok(n) = response.get_i32("n") {
            return Ok(Interpreted::Count(n as i64));
        }
        if let Ok(n) = response.get_i64("n") {
            return Ok(Interpreted::Count(n));
        }
        if response.contains_key("nonce") {
            return Ok(Interpreted::Document(response));
        }
        return Ok(Interpreted::Document(response));
    }

    match response.get_document("cursor") {
        Ok(cursor) => Ok(Interpreted::FirstBatch(first_batch(cursor))),
        Err(_) => Ok(Interpreted::Document(response)),
    }
}

/// Extracts `cursor.firstBatch`/`cursor.nextBatch` from a whole response document, used by the
/// find/aggregate/getMore wrappers on top of the [`Interpreted::Document`] case.
pub(crate) fn cursor_batch(response: &Document) -> Vec<Document> {
    response
        .get_document("cursor")
        .map(first_batch)
        .unwrap_or_default()
}

fn first_batch(cursor: &Document) -> Vec<Document> {
    let key = if cursor.contains_key("nextBatch") {
        "nextBatch"
    } else {
        "firstBatch"
    };
    cursor
        .get_array(key)
        .map(|arr| {
            arr.iter()
                .filter_map(|b| match b {
                    Bson::Document(d) => Some(d.clone()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}
