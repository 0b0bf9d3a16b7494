//! # Module Loader
//!
//! Builds a running hub from a [`RuntimeConfig`]: instantiates each declared
//! module, registers it with a fresh broker, wires the declared links, and
//! later drives start and teardown. Any failure on the way up unwinds
//! everything already built, so a partially constructed graph is never
//! handed back.
//!
//! Error reporting keeps the broker's taxonomy: wiring mistakes surface as
//! [`LoaderError::Wiring`] (carrying the underlying
//! [`LinkError`](hub_broker::LinkError)), module-side failures as their own
//! variants — a configuration author can tell bad wiring from a bad module.

use std::sync::Arc;

use hub_broker::{Broker, BrokerConfig, BrokerError, LinkError, Module, ModuleDescriptor, ModuleError};
use hub_types::ModuleId;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigError, RuntimeConfig};
use crate::messages::DataMessage;
use crate::modules;

/// Errors from building or starting a module graph.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The configuration itself is unusable.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A module entry names a kind no factory provides.
    #[error("unknown module kind '{kind}' for module '{name}'")]
    UnknownKind {
        /// Entry name.
        name: String,
        /// The unresolvable kind.
        kind: String,
    },

    /// A module's `create` capability rejected its arguments.
    #[error("module '{name}' failed to create: {cause}")]
    Create {
        /// Entry name.
        name: String,
        /// The module's own error.
        #[source]
        cause: ModuleError,
    },

    /// The broker refused the registration.
    #[error("module '{name}' could not be registered: {cause}")]
    Register {
        /// Entry name.
        name: String,
        /// The broker's error.
        #[source]
        cause: BrokerError,
    },

    /// A declared link could not be wired.
    #[error("bad wiring '{source_name}' -> '{sink_name}': {cause}")]
    Wiring {
        /// Source entry name.
        source_name: String,
        /// Sink entry name.
        sink_name: String,
        /// The broker's link error.
        #[source]
        cause: LinkError,
    },

    /// A module's optional `start` capability failed.
    #[error("module '{name}' failed to start: {cause}")]
    Start {
        /// Entry name.
        name: String,
        /// The module's own error.
        #[source]
        cause: ModuleError,
    },
}

struct LoadedModule {
    name: String,
    id: ModuleId,
    module: Arc<dyn Module<DataMessage>>,
}

/// A built module graph, ready to start.
pub struct Runtime {
    broker: Broker<DataMessage>,
    modules: Vec<LoadedModule>,
}

impl Runtime {
    /// Build the graph: create and register every module, then wire links.
    pub async fn build(config: RuntimeConfig) -> Result<Self, LoaderError> {
        config.validate()?;
        let broker: Broker<DataMessage> = Broker::with_config(
            BrokerConfig::default().with_channel_capacity(config.broker.channel_capacity),
        );
        let mut loaded: Vec<LoadedModule> = Vec::with_capacity(config.modules.len());

        for entry in &config.modules {
            let Some(module) = modules::built_in(&entry.kind) else {
                Self::unwind(&broker, &mut loaded).await;
                return Err(LoaderError::UnknownKind {
                    name: entry.name.clone(),
                    kind: entry.kind.clone(),
                });
            };

            let id = match module.create(broker.clone(), &entry.args).await {
                Ok(id) => id,
                Err(cause) => {
                    Self::unwind(&broker, &mut loaded).await;
                    return Err(LoaderError::Create {
                        name: entry.name.clone(),
                        cause,
                    });
                }
            };

            if let Err(cause) = broker
                .add_module(ModuleDescriptor::new(id, module.clone()))
                .await
            {
                module.destroy(id).await;
                Self::unwind(&broker, &mut loaded).await;
                return Err(LoaderError::Register {
                    name: entry.name.clone(),
                    cause,
                });
            }

            info!("[loader] module '{}' ({}) registered as {id}", entry.name, entry.kind);
            loaded.push(LoadedModule {
                name: entry.name.clone(),
                id,
                module,
            });
        }

        for link in &config.links {
            // validate() guarantees both names are declared.
            let source = Self::id_of(&loaded, &link.source);
            let sink = Self::id_of(&loaded, &link.sink);
            if let Err(cause) = broker.add_link(source, sink).await {
                Self::unwind(&broker, &mut loaded).await;
                return Err(LoaderError::Wiring {
                    source_name: link.source.clone(),
                    sink_name: link.sink.clone(),
                    cause,
                });
            }
            info!("[loader] link '{}' -> '{}' wired", link.source, link.sink);
        }

        Ok(Self { broker, modules: loaded })
    }

    fn id_of(loaded: &[LoadedModule], name: &str) -> ModuleId {
        loaded
            .iter()
            .find(|m| m.name == name)
            .map_or_else(ModuleId::nil, |m| m.id)
    }

    /// Invoke the optional `start` capability of every module, in
    /// declaration order. Fails fast; already-started modules keep running
    /// until [`shutdown`](Self::shutdown).
    pub async fn start(&self) -> Result<(), LoaderError> {
        for loaded in &self.modules {
            loaded
                .module
                .start(loaded.id)
                .await
                .map_err(|cause| LoaderError::Start {
                    name: loaded.name.clone(),
                    cause,
                })?;
            info!("[loader] module '{}' started", loaded.name);
        }
        Ok(())
    }

    /// Tear everything down in reverse declaration order: deregister each
    /// module (joining its worker), release it through `destroy`, then
    /// destroy the broker.
    pub async fn shutdown(mut self) {
        for loaded in self.modules.drain(..).rev() {
            if let Err(err) = self.broker.remove_module(loaded.id).await {
                warn!("[loader] removing module '{}' failed: {err}", loaded.name);
            }
            loaded.module.destroy(loaded.id).await;
            info!("[loader] module '{}' stopped", loaded.name);
        }
        self.broker.shutdown().await;
        info!("[loader] hub shut down");
    }

    /// Handle to the underlying broker.
    #[must_use]
    pub fn broker(&self) -> &Broker<DataMessage> {
        &self.broker
    }

    /// Identity a configured module name resolved to, if it is loaded.
    #[must_use]
    pub fn module_id(&self, name: &str) -> Option<ModuleId> {
        self.modules.iter().find(|m| m.name == name).map(|m| m.id)
    }

    async fn unwind(broker: &Broker<DataMessage>, loaded: &mut Vec<LoadedModule>) {
        for entry in loaded.drain(..).rev() {
            if let Err(err) = broker.remove_module(entry.id).await {
                warn!("[loader] unwind of module '{}' failed: {err}", entry.name);
            }
            entry.module.destroy(entry.id).await;
        }
        broker.shutdown().await;
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("modules", &self.modules.len())
            .finish_non_exhaustive()
    }
}
