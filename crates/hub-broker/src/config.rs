//! # Broker Configuration

use crate::DEFAULT_CHANNEL_CAPACITY;

/// Tunables for a broker instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Frames buffered per module inbound queue. Once a sink's queue is full,
    /// further messages to that sink are dropped until the worker catches up.
    pub channel_capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl BrokerConfig {
    /// Override the per-module queue capacity.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Load from environment variables, falling back to defaults.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `HUB_CHANNEL_CAPACITY` | `1000` | Frames buffered per module |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(val) = std::env::var("HUB_CHANNEL_CAPACITY") {
            match val.parse::<usize>() {
                Ok(capacity) if capacity > 0 => config.channel_capacity = capacity,
                _ => {
                    tracing::warn!(
                        value = %val,
                        "ignoring unparsable HUB_CHANNEL_CAPACITY"
                    );
                }
            }
        }
        config
    }
}
