//! Length-prefixed framing for JSON-RPC messages.
//!
//! Every frame is a 4-byte big-endian payload length followed by the UTF-8
//! JSON text of one [`Message`].

use bytes::{Buf, BufMut, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

use crate::protocol::Message;

/// Largest accepted payload. Commands and status replies are tiny; the
/// licenses listing is the biggest thing that crosses the socket.
pub const MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;

const HEADER_LEN: usize = 4;

#[derive(Debug, Default)]
pub struct JsonRpcCodec {
    pending_len: Option<usize>,
}

impl JsonRpcCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for JsonRpcCodec {
    type Item = Message;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let len = match self.pending_len {
            Some(len) => len,
            None if src.len() < HEADER_LEN => return Ok(None),
            None => {
                let len = src.get_u32() as usize;
                if len > MAX_FRAME_SIZE {
                    return Err(CodecError::FrameTooLarge(len));
                }
                self.pending_len = Some(len);
                len
            }
        };

        if src.len() < len {
            src.reserve(len - src.len());
            return Ok(None);
        }

        self.pending_len = None;
        let payload = src.split_to(len);
        let message = serde_json::from_str(std::str::from_utf8(&payload)?)?;
        Ok(Some(message))
    }
}

impl Encoder<Message> for JsonRpcCodec {
    type Error = CodecError;

    // Length is bounded by MAX_FRAME_SIZE, which fits in u32
    #[allow(clippy::cast_possible_truncation)]
    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = serde_json::to_vec(&item)?;
        if payload.len() > MAX_FRAME_SIZE {
            return Err(CodecError::FrameTooLarge(payload.len()));
        }

        dst.reserve(HEADER_LEN + payload.len());
        dst.put_u32(payload.len() as u32);
        dst.put_slice(&payload);
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Frame too large: {0} bytes (max: {MAX_FRAME_SIZE})")]
    FrameTooLarge(usize),
}
