//! # Relay Module
//!
//! Forwards every received message under its own identity, so sinks linked
//! to the relay observe traffic the relay observes. Optionally tags the
//! forwarded copy with a `via` property.

use async_trait::async_trait;
use hub_broker::{Broker, Module, ModuleError};
use hub_types::ModuleId;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::messages::DataMessage;

#[derive(Clone)]
struct State {
    broker: Broker<DataMessage>,
    id: ModuleId,
    tag: Option<String>,
}

/// Forwarding module.
///
/// `args`: `{ "tag": "hop-1" }`, optional.
#[derive(Default)]
pub struct RelayModule {
    state: Mutex<Option<State>>,
}

#[async_trait]
impl Module<DataMessage> for RelayModule {
    async fn create(
        &self,
        broker: Broker<DataMessage>,
        config: &serde_json::Value,
    ) -> Result<ModuleId, ModuleError> {
        let tag = config
            .get("tag")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        let id = ModuleId::generate();
        *self.state.lock() = Some(State { broker, id, tag });
        Ok(id)
    }

    async fn receive(&self, _id: ModuleId, message: DataMessage) {
        let Some(state) = self.state.lock().clone() else {
            warn!("[relay] dropping message received before create");
            return;
        };

        let mut forwarded = message;
        if let Some(tag) = state.tag {
            forwarded.properties.insert("via".to_string(), tag);
        }
        if let Err(err) = state.broker.publish(state.id, &forwarded).await {
            warn!("[relay] forward failed: {err}");
        }
    }

    async fn destroy(&self, _id: ModuleId) {
        self.state.lock().take();
        info!("[relay] destroyed");
    }
}
