//! # Runtime Configuration
//!
//! The declarative description of a module graph: which modules to
//! instantiate, with what arguments, and which links to wire between them.
//!
//! ```json
//! {
//!   "broker": { "channel_capacity": 1000 },
//!   "modules": [
//!     { "name": "beat", "kind": "heartbeat", "args": { "interval_ms": 1000 } },
//!     { "name": "hop",  "kind": "relay",     "args": { "tag": "hop" } },
//!     { "name": "out",  "kind": "printer" }
//!   ],
//!   "links": [
//!     { "source": "beat", "sink": "hop" },
//!     { "source": "hop",  "sink": "out" }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON for this schema.
    #[error("failed to parse {path}")]
    Parse {
        /// Path that failed.
        path: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A module entry is missing its name or kind.
    #[error("module entry {0} is missing a name or kind")]
    IncompleteEntry(usize),

    /// Two module entries share a name.
    #[error("duplicate module name '{0}'")]
    DuplicateName(String),

    /// A link names a module that no entry declares.
    #[error("link '{src}' -> '{sink}' references an undeclared module")]
    UndeclaredModule {
        /// Source side of the offending link.
        src: String,
        /// Sink side of the offending link.
        sink: String,
    },
}

/// Broker tunables exposed through the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerSettings {
    /// Frames buffered per module inbound queue.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    hub_broker::DEFAULT_CHANNEL_CAPACITY
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// One module to instantiate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEntry {
    /// Name the links refer to. Unique within a configuration.
    pub name: String,
    /// Built-in module kind to instantiate.
    pub kind: String,
    /// Opaque arguments handed to the module's `create` capability.
    #[serde(default)]
    pub args: serde_json::Value,
}

/// One directed link between two declared modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    /// Module whose output is observed.
    pub source: String,
    /// Module that receives it.
    pub sink: String,
}

/// The whole module graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RuntimeConfig {
    /// Broker tunables.
    #[serde(default)]
    pub broker: BrokerSettings,
    /// Modules to instantiate, in order.
    #[serde(default)]
    pub modules: Vec<ModuleEntry>,
    /// Links to wire after every module is registered.
    #[serde(default)]
    pub links: Vec<LinkEntry>,
}

impl RuntimeConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the loader could only fail on later: duplicate
    /// or empty names and links to undeclared modules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for (index, entry) in self.modules.iter().enumerate() {
            if entry.name.is_empty() || entry.kind.is_empty() {
                return Err(ConfigError::IncompleteEntry(index));
            }
            if !names.insert(entry.name.as_str()) {
                return Err(ConfigError::DuplicateName(entry.name.clone()));
            }
        }
        for link in &self.links {
            if !names.contains(link.source.as_str()) || !names.contains(link.sink.as_str()) {
                return Err(ConfigError::UndeclaredModule {
                    src: link.source.clone(),
                    sink: link.sink.clone(),
                });
            }
        }
        Ok(())
    }
}
