//! # Hub Types
//!
//! Shared contracts between the broker core and module hosts:
//!
//! - [`ModuleId`]: the fixed-width opaque identity every module carries on
//!   the wire.
//! - [`BusMessage`]: the codec contract a message type must satisfy to travel
//!   through the broker.
//! - [`CodecError`]: the error family for both envelope and message codecs.
//!
//! The broker treats message content as opaque beyond "can be serialized
//! to/from bytes"; everything content-specific lives with the module hosts.

pub mod identity;
pub mod message;

pub use identity::{ModuleId, MODULE_ID_LEN};
pub use message::{BusMessage, CodecError};
