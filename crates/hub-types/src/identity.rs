//! # Module Identity
//!
//! Every registered module is identified by an opaque 16-byte [`ModuleId`].
//! The id doubles as the fixed-width source prefix of every wire envelope,
//! so its width is part of the wire contract.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Width of a [`ModuleId`] on the wire, in bytes.
pub const MODULE_ID_LEN: usize = 16;

/// Opaque identity of one registered module.
///
/// Generated by the module host at create time and never interpreted by the
/// broker beyond equality and its fixed-width byte form. The nil id is
/// reserved as "no module" and rejected by every broker entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct ModuleId(Uuid);

impl ModuleId {
    /// Generate a fresh, process-unique id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The reserved "no module" id.
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Whether this is the reserved nil id.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// The fixed-width wire form.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; MODULE_ID_LEN] {
        self.0.as_bytes()
    }

    /// Rebuild an id from its wire form.
    #[must_use]
    pub fn from_bytes(bytes: [u8; MODULE_ID_LEN]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form: the first uuid field is enough to tell modules apart
        // in log output.
        let s = self.0.simple().to_string();
        write!(f, "{}", &s[..8])
    }
}
