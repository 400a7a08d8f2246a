//! The `Error` and `Result` types used throughout this crate.

use std::{collections::HashSet, fmt, sync::Arc};

use bson::{self, Document};
use thiserror::Error;

use crate::concern::WriteConcernError;

/// Retryable write error label, attached when a write failed for a reason the caller may
/// safely retry.
pub const RETRYABLE_WRITE_ERROR: &str = "RetryableWriteError";
/// Attached to a failure that occurred during a transaction and that can be recovered from by
/// retrying the whole transaction from `start_transaction`.
pub const TRANSIENT_TRANSACTION_ERROR: &str = "TransientTransactionError";
/// Attached to a `commitTransaction` failure where it is unknown whether the commit applied;
/// safe to retry the commit (not the whole transaction) until it resolves.
pub const UNKNOWN_TRANSACTION_COMMIT_RESULT: &str = "UnknownTransactionCommitResult";

const NETWORK_CODES: [i32; 6] = [6, 7, 9001, 11600, 11601, 11602];
const TIMEOUT_CODES: [i32; 3] = [50, 89, 11601];
const DUPLICATE_KEY_CODES: [i32; 2] = [11000, 11001];
const TRANSIENT_TRANSACTION_CODES: [i32; 7] = [251, 91, 189, 262, 10107, 13435, 13436];
const UNKNOWN_COMMIT_RESULT_CODES: [i32; 10] =
    [50, 91, 189, 262, 9001, 10107, 11600, 11602, 13435, 13436];

/// The result type returned by all fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error produced by this crate. Cheaply cloneable; the inner kind is wrapped in an `Arc`
/// so that errors can be retained (e.g. by a failed `withTransaction` attempt) without forcing
/// callers to clone large payloads.
#[derive(Clone, Debug, Error)]
#[error("{kind}")]
pub struct Error {
    kind: Arc<ErrorKind>,
    labels: HashSet<String>,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        let labels = kind.default_labels();
        Self {
            kind: Arc::new(kind),
            labels,
        }
    }

    pub(crate) fn with_labels(kind: ErrorKind, labels: impl IntoIterator<Item = String>) -> Self {
        let mut set = kind.default_labels();
        set.extend(labels);
        Self {
            kind: Arc::new(kind),
            labels: set,
        }
    }

    /// The category of failure.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Whether this error carries the given server-assigned error label.
    pub fn contains_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// All error labels attached to this error.
    pub fn labels(&self) -> &HashSet<String> {
        &self.labels
    }

    /// The server error code, if this wraps a server response.
    pub fn code(&self) -> Option<i32> {
        match &*self.kind {
            ErrorKind::Command(c) => Some(c.code),
            ErrorKind::Write(WriteFailure::WriteError(e)) => Some(e.code),
            ErrorKind::Write(WriteFailure::WriteConcernError(e)) => Some(e.code),
            ErrorKind::DuplicateKey { code, .. } => Some(*code),
            ErrorKind::Timeout { code, .. } => Some(*code),
            ErrorKind::Network { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub(crate) fn is_network_error(&self) -> bool {
        matches!(&*self.kind, ErrorKind::Io(_) | ErrorKind::Network { .. })
            || self.code().is_some_and(|c| NETWORK_CODES.contains(&c))
    }

    /// Whether this error should cause `withTransaction` to retry the entire transaction.
    pub fn is_transient_transaction_error(&self) -> bool {
        self.contains_label(TRANSIENT_TRANSACTION_ERROR)
            || self.is_network_error()
            || self.code().is_some_and(|c| TRANSIENT_TRANSACTION_CODES.contains(&c))
    }

    /// Whether this error should cause `withTransaction` to retry only the commit.
    pub fn is_unknown_transaction_commit_result(&self) -> bool {
        self.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT)
            || self.is_network_error()
            || self.code().is_some_and(|c| UNKNOWN_COMMIT_RESULT_CODES.contains(&c))
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::new(ErrorKind::Io(Arc::new(e)))
    }
}

impl From<bson::ser::Error> for Error {
    fn from(e: bson::ser::Error) -> Self {
        Error::new(ErrorKind::BsonSerialization(e))
    }
}

impl From<bson::de::Error> for Error {
    fn from(e: bson::de::Error) -> Self {
        Error::new(ErrorKind::BsonDeserialization(e))
    }
}

/// The category of a failure. Matched against rather than string-compared so callers never
/// need to parse error messages to branch on failure type.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A user-supplied argument or option failed validation before any network I/O occurred.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A read or write concern failed validation.
    #[error("invalid concern: {message}")]
    InvalidConcern { message: String },

    /// SCRAM authentication failed, either due to a malformed exchange or server rejection.
    #[error("authentication error: {message}")]
    Authentication { message: String },

    /// The TCP connection to the server could not be established, or failed during the
    /// SCRAM handshake before any user command had been issued.
    #[error("connection error: {message}")]
    Connection { message: String },

    /// A `send`/`receive` round trip failed after the single permitted reconnect attempt.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// `receive` exhausted its backoff budget without a complete message arriving.
    #[error("timed out waiting for a response from the server")]
    ReceiveTimeout,

    /// The wire-protocol framing was malformed (bad length prefix, truncated header, ...).
    #[error("framing error: {message}")]
    Framing { message: String },

    /// Wrapper around `bson::de::Error`.
    #[error("{0}")]
    BsonDeserialization(bson::de::Error),

    /// Wrapper around `bson::ser::Error`.
    #[error("{0}")]
    BsonSerialization(bson::ser::Error),

    /// Wrapper around `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(Arc<std::io::Error>),

    /// A lower-level network failure (unreachable host, reset connection, ...) that is not
    /// represented as a raw `io::Error` (e.g. detected via a server error code).
    #[error("network error: {message}")]
    Network { code: i32, message: String },

    /// `maxTimeMS` (or the receive backoff ceiling) was exceeded.
    #[error("operation timed out: {message}")]
    Timeout { code: i32, message: String },

    /// The server rejected a command outright (top-level `errmsg`/`ok: 0`).
    #[error("command failed: {0}")]
    Command(CommandError),

    /// One or more individual writes in a write command failed.
    #[error("write error: {0:?}")]
    Write(WriteFailure),

    /// A multi-document write operation (insertMany/bulk upsert) partially failed.
    #[error("bulk write error: {0:?}")]
    BulkWrite(BulkWriteFailure),

    /// Attempted to insert a duplicate `_id` or unique-indexed value.
    #[error("duplicate key error: {message}")]
    DuplicateKey { code: i32, message: String },

    /// `createCollection` was called for a collection that already exists.
    #[error("collection already exists: {name}")]
    AlreadyExists { name: String },

    /// A session/transaction state-machine rule was violated.
    #[error("transaction error: {message}")]
    Transaction { message: String },

    /// The server returned a response this client could not interpret.
    #[error("invalid response from server: {message}")]
    InvalidResponse { message: String },
}

impl ErrorKind {
    fn default_labels(&self) -> HashSet<String> {
        let mut labels = HashSet::new();
        match self {
            ErrorKind::Command(c) => {
                if TRANSIENT_TRANSACTION_CODES.contains(&c.code) {
                    labels.insert(TRANSIENT_TRANSACTION_ERROR.to_string());
                }
                if UNKNOWN_COMMIT_RESULT_CODES.contains(&c.code) {
                    labels.insert(UNKNOWN_TRANSACTION_COMMIT_RESULT.to_string());
                }
            }
            ErrorKind::Io(_) | ErrorKind::Network { .. } | ErrorKind::Transport { .. } => {
                labels.insert(TRANSIENT_TRANSACTION_ERROR.to_string());
                labels.insert(UNKNOWN_TRANSACTION_COMMIT_RESULT.to_string());
                labels.insert(RETRYABLE_WRITE_ERROR.to_string());
            }
            _ => {}
        }
        labels
    }

    pub(crate) fn duplicate_key_from_write_error(err: &WriteError) -> bool {
        DUPLICATE_KEY_CODES.contains(&err.code)
    }

    pub(crate) fn categorize_code(code: i32, code_name: String, message: String) -> ErrorKind {
        if DUPLICATE_KEY_CODES.contains(&code) {
            ErrorKind::DuplicateKey { code, message }
        } else if TIMEOUT_CODES.contains(&code) {
            ErrorKind::Timeout { code, message }
        } else if NETWORK_CODES.contains(&code) {
            ErrorKind::Network { code, message }
        } else {
            ErrorKind::Command(CommandError {
                code,
                code_name,
                message,
            })
        }
    }
}

/// A top-level command failure (`ok: 0` with an `errmsg`).
#[derive(Debug, Clone)]
pub struct CommandError {
    pub code: i32,
    pub code_name: String,
    pub message: String,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{} {}: {}", self.code, self.code_name, self.message)
    }
}

/// A single entry from a server `writeErrors` array.
#[derive(Debug, Clone)]
pub struct WriteError {
    pub index: usize,
    pub code: i32,
    pub message: String,
}

/// Either an individual write error or a write-concern error surfaced outside a bulk context.
#[derive(Debug, Clone)]
pub enum WriteFailure {
    WriteError(WriteError),
    WriteConcernError(WriteConcernError),
}

/// The result of a multi-document write that partially failed.
#[derive(Debug, Clone, Default)]
pub struct BulkWriteFailure {
    pub write_errors: Vec<WriteError>,
    pub write_concern_error: Option<WriteConcernError>,
    /// Indices of `_id` values (relative to the request batch) that were written before the
    /// failure was hit.
    pub inserted_indices: Vec<usize>,
}

/// Parses a raw server response document into a categorized failure, or `None` if the command
/// succeeded (see the Response Interpreter order of checks).
pub(crate) fn interpret_command_error(doc: &Document) -> Option<ErrorKind> {
    if let Some(write_errors) = doc.get_array("writeErrors").ok() {
        if let Some(first) = write_errors.first().and_then(|b| b.as_document()) {
            let code = first.get_i32("code").unwrap_or(0);
            let code_name = first.get_str("codeName").unwrap_or("").to_string();
            let message = first
                .get_str("errmsg")
                .unwrap_or("unknown write error")
                .to_string();
            return Some(ErrorKind::categorize_code(code, code_name, message));
        }
    }

    if let Some(wce) = write_concern_error(doc) {
        return Some(ErrorKind::Write(WriteFailure::WriteConcernError(wce)));
    }

    if let Ok(errmsg) = doc.get_str("errmsg") {
        let code = doc.get_i32("code").unwrap_or(-1);
        let code_name = doc.get_str("codeName").unwrap_or("").to_string();
        return Some(ErrorKind::categorize_code(code, code_name, errmsg.to_string()));
    }

    None
}

/// Extracts a `writeConcernError` failure from a command response: either the singular
/// `writeConcernError` document the server sends for a single-statement write, or the first
/// entry of a `writeConcernErrors` array from a bulk context. A write-concern failure reports
/// `ok: 1` at the top level (the write itself applied), so this must be checked even on an
/// otherwise-successful response, per spec.md §4.4/§7.
fn write_concern_error(doc: &Document) -> Option<WriteConcernError> {
    if let Ok(wce) = doc.get_document("writeConcernError") {
        return bson::from_document(wce.clone()).ok();
    }
    if let Ok(array) = doc.get_array("writeConcernErrors") {
        if let Some(first) = array.first().and_then(|b| b.as_document()) {
            return bson::from_document(first.clone()).ok();
        }
    }
    None
}
