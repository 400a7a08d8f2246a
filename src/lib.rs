//! A native MongoDB wire-protocol client: `OP_MSG` framing, SCRAM authentication, and a
//! session/transaction coordinator, speaking directly to `mongod`/`mongos` without vendoring a
//! driver runtime.
//!
//! See [`Client`] for the connected handle everything else hangs off, [`Database`]/
//! [`Collection`] for the high-level CRUD surface, and [`client::Session`] for multi-document
//! transactions.

pub mod client;
mod cmap;
pub mod coll;
pub mod concern;
pub mod db;
pub mod error;
mod operation;
mod response;
pub mod results;
#[cfg(feature = "sync")]
pub mod sync;
mod wire;

pub use client::{Client, ClientOptions, ConnectionInfo, Session};
pub use cmap::Scheduling;
pub use coll::{Collection, OperationOptions};
pub use concern::{Acknowledgment, ReadConcern, WriteConcern, WriteConcernError};
pub use db::Database;
pub use error::{Error, ErrorKind, Result};
pub use operation::{FindAndModifyOptions, IndexModel, UpsertOp};
