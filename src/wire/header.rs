use std::sync::atomic::{AtomicI32, Ordering};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, ErrorKind, Result};

/// `OP_MSG`, the only opcode this client emits or expects to receive.
pub(crate) const OP_MSG: u32 = 2013;

/// `messageLength(4) + requestId(4) + responseTo(4) + opCode(4)`.
pub(crate) const HEADER_LENGTH: usize = 16;

/// Minimum legal `messageLength`: the 16-byte header plus the 4-byte `flagBits` and a 1-byte
/// payload type and the smallest possible BSON document (an empty one, 5 bytes).
pub(crate) const MIN_MESSAGE_LENGTH: i32 = 21;

/// Maximum accepted response size, per spec.md §4.2.
pub(crate) const MAX_MESSAGE_LENGTH: i32 = 16 * 1024 * 1024;

static NEXT_REQUEST_ID: AtomicI32 = AtomicI32::new(0);

/// Returns a fresh, stable-per-connection request id.
pub(crate) fn next_request_id() -> i32 {
    NEXT_REQUEST_ID.fetch_add(1, Ordering::SeqCst)
}

/// The 16-byte `OP_MSG` header.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Header {
    pub(crate) length: i32,
    pub(crate) request_id: i32,
    pub(crate) response_to: i32,
    pub(crate) op_code: u32,
}

impl Header {
    pub(crate) async fn write_to<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.length.to_le_bytes()).await?;
        writer.write_all(&self.request_id.to_le_bytes()).await?;
        writer.write_all(&self.response_to.to_le_bytes()).await?;
        writer.write_all(&self.op_code.to_le_bytes()).await?;
        Ok(())
    }

    /// Decodes a header from exactly [`HEADER_LENGTH`] bytes, validating `length` against
    /// spec.md §4.1's bounds.
    pub(crate) fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LENGTH {
            return Err(framing_error(format!(
                "expected {HEADER_LENGTH} header bytes, got {}",
                bytes.len()
            )));
        }
        let length = i32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let request_id = i32::from_le_bytes(bytes[4..8].try_into().unwrap());
        let response_to = i32::from_le_bytes(bytes[8..12].try_into().unwrap());
        let op_code = u32::from_le_bytes(bytes[12..16].try_into().unwrap());

        if length < MIN_MESSAGE_LENGTH {
            return Err(framing_error(format!(
                "messageLength {length} is below the minimum of {MIN_MESSAGE_LENGTH}"
            )));
        }
        if length > MAX_MESSAGE_LENGTH {
            return Err(framing_error(format!(
                "messageLength {length} exceeds the {MAX_MESSAGE_LENGTH} byte cap"
            )));
        }

        Ok(Self {
            length,
            request_id,
            response_to,
            op_code,
        })
    }

    pub(crate) async fn read_from<R: AsyncRead + Unpin + Send>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; HEADER_LENGTH];
        reader.read_exact(&mut buf).await?;
        Self::decode(&buf)
    }
}

pub(crate) fn framing_error(message: impl Into<String>) -> Error {
    ErrorKind::Framing {
        message: message.into(),
    }
    .into()
}
