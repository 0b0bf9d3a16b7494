//! # Heartbeat Module
//!
//! A pure source: after `start`, publishes a numbered beat message on a fixed
//! interval until destroyed or the broker closes.

use std::time::Duration;

use async_trait::async_trait;
use hub_broker::{Broker, Module, ModuleError};
use hub_types::ModuleId;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::messages::DataMessage;

const DEFAULT_INTERVAL_MS: u64 = 1000;

struct State {
    broker: Broker<DataMessage>,
    id: ModuleId,
    label: String,
    interval: Duration,
    stop: watch::Sender<bool>,
    ticker: Option<JoinHandle<()>>,
}

/// Periodic message source.
///
/// `args`: `{ "interval_ms": 1000, "label": "beat" }`, both optional.
#[derive(Default)]
pub struct HeartbeatModule {
    state: Mutex<Option<State>>,
}

impl HeartbeatModule {
    fn parse_interval(config: &serde_json::Value) -> Result<Duration, ModuleError> {
        match config.get("interval_ms") {
            None => Ok(Duration::from_millis(DEFAULT_INTERVAL_MS)),
            Some(value) => match value.as_u64() {
                Some(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
                _ => Err(ModuleError::BadConfig(format!(
                    "interval_ms must be a positive integer, got {value}"
                ))),
            },
        }
    }
}

#[async_trait]
impl Module<DataMessage> for HeartbeatModule {
    async fn create(
        &self,
        broker: Broker<DataMessage>,
        config: &serde_json::Value,
    ) -> Result<ModuleId, ModuleError> {
        let interval = Self::parse_interval(config)?;
        let label = config
            .get("label")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("heartbeat")
            .to_string();
        let id = ModuleId::generate();
        let (stop, _) = watch::channel(false);

        *self.state.lock() = Some(State {
            broker,
            id,
            label,
            interval,
            stop,
            ticker: None,
        });
        Ok(id)
    }

    async fn start(&self, id: ModuleId) -> Result<(), ModuleError> {
        let mut guard = self.state.lock();
        let state = guard
            .as_mut()
            .ok_or_else(|| ModuleError::StartFailed("heartbeat was never created".into()))?;
        if state.id != id {
            return Err(ModuleError::StartFailed(
                "identity does not match this instance".into(),
            ));
        }
        if state.ticker.is_some() {
            return Err(ModuleError::StartFailed("heartbeat already started".into()));
        }

        let broker = state.broker.clone();
        let label = state.label.clone();
        let period = state.interval;
        let id = state.id;
        let mut stop = state.stop.subscribe();
        state.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick fires immediately; skip it so beats are evenly
            // spaced from start.
            interval.tick().await;
            let mut seq = 0u64;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        seq += 1;
                        let message = DataMessage::text(format!("beat {seq}"))
                            .with_property("module", label.clone())
                            .with_property("seq", seq.to_string());
                        if let Err(err) = broker.publish(id, &message).await {
                            debug!("[heartbeat] {label}: publishing stopped: {err}");
                            break;
                        }
                    }
                    _ = stop.changed() => break,
                }
            }
            debug!("[heartbeat] {label}: ticker stopped after {seq} beats");
        }));
        info!("[heartbeat] started with period {period:?}");
        Ok(())
    }

    async fn receive(&self, _id: ModuleId, _message: DataMessage) {
        // A source has no use for inbound messages; linking one is a wiring
        // mistake worth surfacing in the logs.
        warn!("[heartbeat] ignoring inbound message");
    }

    async fn destroy(&self, _id: ModuleId) {
        let state = self.state.lock().take();
        if let Some(state) = state {
            let _ = state.stop.send(true);
            if let Some(ticker) = state.ticker {
                let _ = ticker.await;
            }
            info!("[heartbeat] destroyed");
        }
    }
}
