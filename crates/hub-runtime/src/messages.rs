//! # Data Message
//!
//! The message type the built-in modules exchange: a property bag plus an
//! opaque content buffer, serialized with bincode. The broker never sees this
//! structure — it only routes the encoded bytes.

use std::collections::BTreeMap;

use bytes::Bytes;
use hub_types::{BusMessage, CodecError};
use serde::{Deserialize, Serialize};

/// A property bag plus opaque content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DataMessage {
    /// String key/value metadata. Ordered so the encoded form is stable.
    pub properties: BTreeMap<String, String>,
    /// Opaque content bytes.
    pub content: Vec<u8>,
}

impl DataMessage {
    /// An empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A message whose content is UTF-8 text.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            properties: BTreeMap::new(),
            content: content.into().into_bytes(),
        }
    }

    /// Attach one property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// The content as lossy UTF-8, for log output.
    #[must_use]
    pub fn content_lossy(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }
}

impl BusMessage for DataMessage {
    fn encode(&self) -> Result<Bytes, CodecError> {
        bincode::serialize(self)
            .map(Bytes::from)
            .map_err(|err| CodecError::Malformed(err.to_string()))
    }

    fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        bincode::deserialize(buf).map_err(|err| CodecError::Malformed(err.to_string()))
    }
}
