//! Transport: TCP connect/send/receive plus the `Command` abstraction the operation layer and
//! session coordinator build on.

mod command;
mod connection;

use bson::Document;

pub use connection::Scheduling;
pub(crate) use command::Command;
pub(crate) use connection::Connection;

use crate::error::Result;

/// Frames, sends, and receives a single command round trip, returning the raw response
/// document with no error interpretation (that's the Response Interpreter's job, layered on
/// top of this for user-facing operations). Used directly by the SCRAM handshake, which runs
/// before sessions or response categorization exist.
pub(crate) async fn execute(conn: &mut Connection, command: Command) -> Result<Document> {
    let message = command.into_message();
    let bytes = message.encode()?;
    conn.send(&bytes).await?;
    let response = conn.receive().await?;
    Ok(response.body)
}
