//! # Module Capability Table
//!
//! The contract a module host satisfies to plug into the broker. The broker
//! itself invokes only [`receive`](Module::receive); `create`, `start`, and
//! `destroy` belong to the loader that drives the module's lifecycle and then
//! hands the resulting identity to
//! [`Broker::add_module`](crate::Broker::add_module).

use std::sync::Arc;

use async_trait::async_trait;
use hub_types::{BusMessage, ModuleId};
use thiserror::Error;

use crate::broker::Broker;

/// Failures reported by a module's own lifecycle capabilities.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModuleError {
    /// The configuration value handed to `create` was rejected.
    #[error("module configuration rejected: {0}")]
    BadConfig(String),

    /// `start` could not bring the module to its running state.
    #[error("module failed to start: {0}")]
    StartFailed(String),

    /// Any other failure inside the module host.
    #[error("module failure: {0}")]
    Internal(String),
}

/// Capability table of one pluggable module.
///
/// `create`, `receive`, and `destroy` are required by construction; `start`
/// is the one optional capability and defaults to a no-op.
#[async_trait]
pub trait Module<M: BusMessage>: Send + Sync {
    /// Instantiate the module. Returns the identity the loader will register
    /// under. The broker handle is the module's only way to publish.
    ///
    /// Never called by the broker.
    async fn create(
        &self,
        broker: Broker<M>,
        config: &serde_json::Value,
    ) -> Result<ModuleId, ModuleError>;

    /// Begin active work, if the module has any. Called by the loader after
    /// registration, so anything published from here can already be routed.
    async fn start(&self, id: ModuleId) -> Result<(), ModuleError> {
        let _ = id;
        Ok(())
    }

    /// Handle one delivered message. Invoked on the module's dedicated
    /// worker task, one message at a time; the next message is not
    /// dispatched until this call returns.
    async fn receive(&self, id: ModuleId, message: M);

    /// Release everything `create` acquired. Never called by the broker.
    async fn destroy(&self, id: ModuleId);
}

/// What `add_module` consumes: the identity obtained from `create` plus the
/// capability table it came from.
pub struct ModuleDescriptor<M: BusMessage> {
    /// Identity the registration will be keyed on.
    pub id: ModuleId,
    /// The module's capability table.
    pub module: Arc<dyn Module<M>>,
}

impl<M: BusMessage> ModuleDescriptor<M> {
    /// Pair an identity with its capability table.
    #[must_use]
    pub fn new(id: ModuleId, module: Arc<dyn Module<M>>) -> Self {
        Self { id, module }
    }
}

impl<M: BusMessage> Clone for ModuleDescriptor<M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            module: Arc::clone(&self.module),
        }
    }
}

impl<M: BusMessage> std::fmt::Debug for ModuleDescriptor<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
