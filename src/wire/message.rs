use bson::Document;

use super::header::{framing_error, Header, HEADER_LENGTH, OP_MSG};
use crate::error::Result;

bitflags::bitflags! {
    /// `flagBits` of an `OP_MSG`. This client never sets any bit on requests (spec.md §4.1) but
    /// recognizes `CHECKSUM_PRESENT` on responses so it can skip the trailing CRC.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct MessageFlags: u32 {
        const CHECKSUM_PRESENT = 0b0000_0000_0000_0000_0000_0000_0000_0001;
        const MORE_TO_COME     = 0b0000_0000_0000_0000_0000_0000_0000_0010;
        const EXHAUST_ALLOWED  = 0b0000_0001_0000_0000_0000_0000_0000_0000;
    }
}

/// A framed `OP_MSG` message: header + flagBits + a single payload-type-0 section.
///
/// This client only ever emits a single BSON document as the payload (spec.md §4.1); document
/// sequences (payload type 1) are a non-goal since no operation this client issues needs them.
#[derive(Debug)]
pub(crate) struct Message {
    pub(crate) request_id: i32,
    pub(crate) response_to: i32,
    pub(crate) body: Document,
}

impl Message {
    pub(crate) fn new_request(body: Document) -> Self {
        Self {
            request_id: super::header::next_request_id(),
            response_to: 0,
            body,
        }
    }

    /// Encodes this message to bytes exactly as spec.md §4.1 lays out the frame.
    pub(crate) fn encode(&self) -> Result<Vec<u8>> {
        let mut body_bytes = Vec::new();
        self.body.to_writer(&mut body_bytes)?;

        let message_length = HEADER_LENGTH as i32 + 4 + 1 + body_bytes.len() as i32;

        let header = Header {
            length: message_length,
            request_id: self.request_id,
            response_to: self.response_to,
            op_code: OP_MSG,
        };

        let mut out = Vec::with_capacity(message_length as usize);
        out.extend_from_slice(&header.length.to_le_bytes());
        out.extend_from_slice(&header.request_id.to_le_bytes());
        out.extend_from_slice(&header.response_to.to_le_bytes());
        out.extend_from_slice(&header.op_code.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // flagBits
        out.push(0); // payloadType
        out.extend_from_slice(&body_bytes);

        Ok(out)
    }

    /// Decodes a complete frame (header already validated, all `header.length` bytes present in
    /// `rest`, i.e. everything after the 16-byte header).
    pub(crate) fn decode(header: Header, rest: &[u8]) -> Result<Self> {
        if rest.len() < 4 {
            return Err(framing_error("message is missing flagBits"));
        }
        let flags = MessageFlags::from_bits_truncate(u32::from_le_bytes(
            rest[0..4].try_into().unwrap(),
        ));

        let checksum_len = if flags.contains(MessageFlags::CHECKSUM_PRESENT) {
            4
        } else {
            0
        };

        let payload = &rest[4..rest.len() - checksum_len];

        // A frame with no document bytes after the payload-type marker (the 21-byte
        // minimum-length boundary case) represents an empty document rather than a malformed
        // one.
        if payload.len() < 2 {
            return Ok(Self {
                request_id: header.request_id,
                response_to: header.response_to,
                body: Document::new(),
            });
        }

        let payload_type = payload[0];
        if payload_type != 0 {
            return Err(framing_error(format!(
                "unsupported OP_MSG payload type {payload_type}"
            )));
        }

        let body = Document::from_reader(&payload[1..])?;

        Ok(Self {
            request_id: header.request_id,
            response_to: header.response_to,
            body,
        })
    }
}
