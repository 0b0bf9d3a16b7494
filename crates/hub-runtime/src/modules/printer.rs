//! # Printer Module
//!
//! A terminal sink: logs every received message and counts deliveries.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use hub_broker::{Broker, Module, ModuleError};
use hub_types::ModuleId;
use tracing::info;

use crate::messages::DataMessage;

/// Logging sink. Takes no arguments.
#[derive(Default)]
pub struct PrinterModule {
    received: AtomicU64,
}

impl PrinterModule {
    /// Messages delivered so far.
    #[must_use]
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Module<DataMessage> for PrinterModule {
    async fn create(
        &self,
        _broker: Broker<DataMessage>,
        _config: &serde_json::Value,
    ) -> Result<ModuleId, ModuleError> {
        Ok(ModuleId::generate())
    }

    async fn receive(&self, _id: ModuleId, message: DataMessage) {
        let count = self.received.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            "[printer] #{count}: '{}' ({} properties)",
            message.content_lossy(),
            message.properties.len()
        );
    }

    async fn destroy(&self, _id: ModuleId) {
        info!(
            "[printer] destroyed after {} messages",
            self.received()
        );
    }
}
