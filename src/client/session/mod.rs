//! Logical sessions and the transaction state machine (spec.md §3, §4.5).

mod cluster_time;
mod coordinator;
mod registry;

#[cfg(test)]
mod test;

use std::time::{Duration, Instant};

use bson::{spec::BinarySubtype, Binary, Bson, Document};
use uuid::Uuid;

pub(crate) use cluster_time::{CausalConsistencyTracker, ClusterTime};
pub(crate) use coordinator::inject;
pub(crate) use registry::SessionRegistry;

use crate::{
    concern::{ReadConcern, WriteConcern},
    error::{Error, ErrorKind, Result},
};

/// How long a session may sit unused before [`SessionRegistry::cleanup_stale_sessions`] reaps
/// it (spec.md §3).
pub(crate) const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Per-transaction options, captured on `startTransaction` and injected only on the first
/// operation of the transaction (spec.md §4.5).
#[derive(Clone, Debug, Default)]
pub struct TransactionOptions {
    pub read_concern: Option<ReadConcern>,
    pub write_concern: Option<WriteConcern>,
    pub max_commit_time_ms: Option<u64>,
}

/// The lifecycle state of a session's current (or most recent) transaction (spec.md §3, §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    None,
    /// `startTransaction` has been called but no command carrying `startTransaction: true` has
    /// been sent yet.
    Starting,
    InProgress,
    Committed,
    Aborted,
}

/// A MongoDB logical session: an identifier plus the transaction state machine layered on top
/// of it. Not `Send`-shared across concurrent callers — spec.md §5 requires external
/// serialization of access to a single connection, and a session belongs to one connection.
#[derive(Debug, Clone)]
pub struct ClientSession {
    id: Uuid,
    id_document: Document,
    pub(crate) state: TransactionState,
    txn_number: i64,
    last_use: Instant,
    first_operation_done: bool,
    pub(crate) transaction_options: Option<TransactionOptions>,
    retryable_write_number: i64,
    causal_consistency: bool,
}

impl ClientSession {
    pub(crate) fn new(causal_consistency: bool) -> Self {
        let id = Uuid::now_v7();
        let id_document = bson::doc! {
            "id": Bson::Binary(Binary {
                subtype: BinarySubtype::Uuid,
                bytes: id.as_bytes().to_vec(),
            })
        };
        Self {
            id,
            id_document,
            state: TransactionState::None,
            txn_number: 0,
            last_use: Instant::now(),
            first_operation_done: false,
            transaction_options: None,
            retryable_write_number: 0,
            causal_consistency,
        }
    }

    /// Reconstructs a session around a server-assigned `lsid`, as returned by `startSession`.
    pub(crate) fn from_server_id(id_document: Document, causal_consistency: bool) -> Result<Self> {
        let id = extract_uuid(&id_document)?;
        Ok(Self {
            id,
            id_document,
            state: TransactionState::None,
            txn_number: 0,
            last_use: Instant::now(),
            first_operation_done: false,
            transaction_options: None,
            retryable_write_number: 0,
            causal_consistency,
        })
    }

    /// The hex-encoded UUID bytes, used as this session's key in the registry (spec.md §9:
    /// session identifiers as binary UUIDs, keyed by their byte representation, never coerced
    /// to a lossy string form).
    pub(crate) fn registry_key(&self) -> String {
        hex::encode(self.id.as_bytes())
    }

    pub(crate) fn id_document(&self) -> &Document {
        &self.id_document
    }

    pub fn txn_number(&self) -> i64 {
        self.txn_number
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn causal_consistency(&self) -> bool {
        self.causal_consistency
    }

    pub(crate) fn touch(&mut self) {
        self.last_use = Instant::now();
    }

    pub(crate) fn idle_for(&self) -> Duration {
        self.last_use.elapsed()
    }

    pub(crate) fn in_transaction(&self) -> bool {
        matches!(
            self.state,
            TransactionState::Starting | TransactionState::InProgress
        )
    }

    pub(crate) fn first_operation_done(&self) -> bool {
        self.first_operation_done
    }

    pub(crate) fn mark_first_operation_done(&mut self) {
        self.first_operation_done = true;
        self.state = TransactionState::InProgress;
    }

    /// Increments `txnNumber` and moves the session into `Starting`, per spec.md §4.5. No
    /// network call is made here; the server only learns a transaction has started once the
    /// first operation carries `startTransaction: true`.
    pub fn start_transaction(&mut self, options: Option<TransactionOptions>) -> Result<()> {
        if self.state == TransactionState::InProgress || self.state == TransactionState::Starting
        {
            return Err(Error::new(ErrorKind::Transaction {
                message: "a transaction is already in progress on this session".into(),
            }));
        }
        self.txn_number += 1;
        self.state = TransactionState::Starting;
        self.first_operation_done = false;
        self.transaction_options = options;
        Ok(())
    }

    pub(crate) fn mark_committed(&mut self) {
        self.state = TransactionState::Committed;
        self.first_operation_done = false;
    }

    pub(crate) fn mark_aborted(&mut self) {
        self.state = TransactionState::Aborted;
        self.first_operation_done = false;
        self.transaction_options = None;
    }
}

fn extract_uuid(id_document: &Document) -> Result<Uuid> {
    let binary = id_document
        .get("id")
        .and_then(|b| match b {
            Bson::Binary(binary) => Some(binary),
            _ => None,
        })
        .ok_or_else(|| {
            Error::new(ErrorKind::InvalidResponse {
                message: "startSession response missing a binary `lsid.id`".into(),
            })
        })?;
    Uuid::from_slice(&binary.bytes).map_err(|e| {
        Error::new(ErrorKind::InvalidResponse {
            message: format!("lsid.id was not a valid UUID: {e}"),
        })
    })
}
