//! # Hub Broker - Pub/Sub Routing Between Pluggable Modules
//!
//! The central broker of the message hub. Modules register with the broker
//! and declare, via directed links, which other modules' output they want to
//! observe; the broker routes published messages to exactly the registered
//! links, running each module's receive callback on its own dedicated worker
//! task.
//!
//! ## Routing
//!
//! ```text
//! ┌──────────────┐                          ┌──────────────┐
//! │   Module A   │                          │   Module B   │
//! │              │  publish(A, msg)         │  worker task │
//! │              │ ───────┐                 │              │
//! └──────────────┘        │                 └──────────────┘
//!                         ▼                        ↑
//!                  ┌──────────────┐                │ inbound queue
//!                  │    Broker    │                │ (link A→B only)
//!                  │   fan-out    │ ───────────────┘
//!                  └──────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - **Exactly the links**: a message reaches a sink only if a link from its
//!   source is currently registered on that sink.
//! - **FIFO per source→sink pair**: one fan-out point, one inbound queue per
//!   sink.
//! - **Best-effort delivery**: a sink whose queue is full drops the message;
//!   there is no acknowledgement, retry, or persistence.
//! - **Cooperative shutdown**: each registration owns a private shutdown
//!   token; removal delivers it on the same queue as data, so everything
//!   accepted beforehand is drained first, and the worker is joined before
//!   removal returns.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod broker;
pub mod config;
pub mod envelope;
pub mod error;
pub mod module;

mod registration;
mod transport;
mod worker;

// Re-export main types
pub use broker::{Broker, StatsSnapshot};
pub use config::BrokerConfig;
pub use envelope::Envelope;
pub use error::{BrokerError, LinkError, PublishError};
pub use module::{Module, ModuleDescriptor, ModuleError};

/// Maximum frames buffered per module before delivery becomes lossy.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
