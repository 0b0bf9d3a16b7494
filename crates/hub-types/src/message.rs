//! # Message Codec Contract
//!
//! The broker is generic over the message type it routes. A message only has
//! to be serializable to and from a flat byte buffer; its structure is owned
//! entirely by the module hosts.

use bytes::Bytes;
use thiserror::Error;

/// Errors from encoding or decoding wire buffers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer is shorter than the format requires.
    #[error("truncated buffer: need at least {needed} bytes, got {got}")]
    Truncated {
        /// Minimum length the format requires.
        needed: usize,
        /// Actual length of the buffer.
        got: usize,
    },

    /// The buffer has the right shape but its content does not parse.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Contract a message type must satisfy to travel through the broker.
///
/// Encoding happens exactly once per publish, on the publisher's task;
/// decoding happens once per delivery, on the receiving module's worker.
pub trait BusMessage: Send + Sync + Sized + 'static {
    /// Serialize to a flat byte buffer.
    fn encode(&self) -> Result<Bytes, CodecError>;

    /// Rebuild a message from the buffer produced by [`encode`](Self::encode).
    fn decode(buf: &[u8]) -> Result<Self, CodecError>;
}

/// Raw passthrough: hosts that already speak bytes need no further framing.
impl BusMessage for Bytes {
    fn encode(&self) -> Result<Bytes, CodecError> {
        Ok(self.clone())
    }

    fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        Ok(Bytes::copy_from_slice(buf))
    }
}
