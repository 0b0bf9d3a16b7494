//! # Wire Envelope
//!
//! The unit that travels between the fan-out point and every inbound queue:
//! a fixed-width source identity followed by the serialized message payload.
//!
//! ```text
//! ┌────────────────────┬─────────────────────────────┐
//! │ source (16 bytes)  │ payload (0..n bytes)        │
//! └────────────────────┴─────────────────────────────┘
//! ```
//!
//! The shape is bit-exact: an encoded envelope is exactly
//! `MODULE_ID_LEN + payload.len()` bytes, and an empty payload encodes to the
//! 16-byte form a shutdown token would occupy on a cross-process transport.

use bytes::{BufMut, Bytes, BytesMut};
use hub_types::{CodecError, ModuleId, MODULE_ID_LEN};

/// A message plus its originating module identity, in wire form.
///
/// Transient: exists only between `publish` and a worker's receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Identity of the publishing module.
    pub source: ModuleId,
    /// Serialized message bytes.
    pub payload: Bytes,
}

impl Envelope {
    /// Wrap a serialized payload with its source identity.
    #[must_use]
    pub fn new(source: ModuleId, payload: Bytes) -> Self {
        Self { source, payload }
    }

    /// Exact size of the encoded form.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        MODULE_ID_LEN + self.payload.len()
    }

    /// Serialize into a single flat buffer of exactly
    /// [`encoded_len`](Self::encoded_len) bytes.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_slice(self.source.as_bytes());
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    /// Split a wire buffer back into source identity and payload.
    ///
    /// The payload is a zero-copy slice of the input buffer.
    pub fn decode(buf: Bytes) -> Result<Self, CodecError> {
        if buf.len() < MODULE_ID_LEN {
            return Err(CodecError::Truncated {
                needed: MODULE_ID_LEN,
                got: buf.len(),
            });
        }
        let mut id = [0u8; MODULE_ID_LEN];
        id.copy_from_slice(&buf[..MODULE_ID_LEN]);
        Ok(Self {
            source: ModuleId::from_bytes(id),
            payload: buf.slice(MODULE_ID_LEN..),
        })
    }
}
