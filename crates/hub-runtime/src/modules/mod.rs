//! # Built-in Modules
//!
//! The sample modules the runtime can instantiate by kind:
//!
//! - `heartbeat`: publishes a counter message on an interval after `start`.
//! - `relay`: forwards every received message under its own identity,
//!   optionally tagging it.
//! - `printer`: logs and counts received messages.
//!
//! Each is a self-contained implementation of the broker's capability table;
//! none of them knows the others exist.

use std::sync::Arc;

use hub_broker::Module;

use crate::messages::DataMessage;

pub mod heartbeat;
pub mod printer;
pub mod relay;

pub use heartbeat::HeartbeatModule;
pub use printer::PrinterModule;
pub use relay::RelayModule;

/// Resolve a configuration `kind` to a fresh module instance.
#[must_use]
pub fn built_in(kind: &str) -> Option<Arc<dyn Module<DataMessage>>> {
    match kind {
        "heartbeat" => Some(Arc::new(HeartbeatModule::default())),
        "relay" => Some(Arc::new(RelayModule::default())),
        "printer" => Some(Arc::new(PrinterModule::default())),
        _ => None,
    }
}
