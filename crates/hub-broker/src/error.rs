//! # Broker Error Taxonomy
//!
//! Three families, kept distinct so callers can localize failures:
//!
//! - [`BrokerError`]: invalid arguments and registration lifecycle failures.
//! - [`LinkError`]: wiring failures. A configuration-driven loader building a
//!   module graph can tell "bad wiring" apart from "bad module" because link
//!   operations never report wiring mistakes as generic broker errors.
//! - [`PublishError`]: fatal to one message only, never to broker state.

use hub_types::{CodecError, ModuleId};
use thiserror::Error;

/// Errors from broker lifecycle and module registration operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// A parameter was rejected before any side effect.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// `add_module` found an active registration with the same identity.
    #[error("module {0} is already registered")]
    AlreadyRegistered(ModuleId),

    /// `remove_module` found no registration with this identity.
    #[error("module {0} is not registered")]
    NotFound(ModuleId),

    /// The broker has been shut down.
    #[error("broker is closed")]
    Closed,
}

/// Errors from link (subscription) operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The named source has no active registration.
    #[error("link source {0} is not registered")]
    UnknownSource(ModuleId),

    /// The named sink has no active registration.
    #[error("link sink {0} is not registered")]
    UnknownSink(ModuleId),

    /// `add_link` on a pair that is already linked. Links are a set: there
    /// is at most one link per (source, sink) pair.
    #[error("link {src} -> {dst} already exists")]
    AlreadyLinked {
        /// Source side of the rejected link.
        src: ModuleId,
        /// Sink side of the rejected link.
        dst: ModuleId,
    },

    /// `remove_link` on a pair that is not linked.
    #[error("link {src} -> {dst} does not exist")]
    NotLinked {
        /// Source side of the missing link.
        src: ModuleId,
        /// Sink side of the missing link.
        dst: ModuleId,
    },

    /// A non-wiring failure (nil identity, closed broker).
    #[error(transparent)]
    Broker(#[from] BrokerError),
}

/// Errors from `publish`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// The message failed to serialize; nothing was sent.
    #[error("message encoding failed: {0}")]
    Codec(#[from] CodecError),

    /// A non-codec failure (nil source, closed broker).
    #[error(transparent)]
    Broker(#[from] BrokerError),
}
