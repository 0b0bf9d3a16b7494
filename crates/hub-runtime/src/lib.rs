//! # Hub Runtime Library
//!
//! The reference host sitting on top of the broker core. It owns everything
//! the core deliberately leaves to collaborators: reading a declarative
//! configuration, instantiating modules, registering them, wiring links, and
//! driving the create/start/destroy lifecycle.
//!
//! ## Module Graph
//!
//! ```text
//! configuration ──→ Loader ──→ Broker
//!                     │          │
//!        create/start │          │ deliver
//!                     ▼          ▼
//!               [heartbeat] → [relay] → [printer]
//! ```
//!
//! The runtime talks to the core only through the module-registration and
//! publish/receive contracts; nothing here reaches into broker internals.

pub mod config;
pub mod loader;
pub mod messages;
pub mod modules;

// Re-export main types
pub use config::{ConfigError, LinkEntry, ModuleEntry, RuntimeConfig};
pub use loader::{LoaderError, Runtime};
pub use messages::DataMessage;
