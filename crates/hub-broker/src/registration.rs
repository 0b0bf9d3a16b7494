//! # Module Registration
//!
//! Per-module state held in the broker's registry: the filtered sending half
//! of the inbound queue, the registration's private shutdown token, and the
//! worker task handle. The capability table itself lives with the worker,
//! which is the only place the broker ever invokes it.
//!
//! Build order matters: the queue and its subscription state exist before the
//! worker is spawned, so no frame accepted after registration can be missed
//! by the loop. Teardown is the reverse: shutdown frame, close the queue,
//! join the worker.

use std::sync::Arc;

use hub_types::{BusMessage, ModuleId};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::broker::BrokerStats;
use crate::module::Module;
use crate::transport::{self, Endpoint, ShutdownToken};
use crate::worker::{self, WorkerContext};

#[derive(Debug)]
pub(crate) struct ModuleRegistration {
    id: ModuleId,
    endpoint: Endpoint,
    token: ShutdownToken,
    worker: JoinHandle<()>,
}

impl ModuleRegistration {
    /// Open the inbound queue, issue a fresh shutdown token, and spawn the
    /// worker bound to this registration.
    pub(crate) fn spawn<M: BusMessage>(
        id: ModuleId,
        module: Arc<dyn Module<M>>,
        capacity: usize,
        stats: Arc<BrokerStats>,
    ) -> Self {
        let token = ShutdownToken::fresh();
        let (endpoint, inbound) = transport::inbound_channel(id, capacity);
        let worker = tokio::spawn(worker::run(WorkerContext {
            id,
            module,
            token,
            inbound,
            stats,
        }));
        Self {
            id,
            endpoint,
            token,
            worker,
        }
    }

    pub(crate) fn id(&self) -> ModuleId {
        self.id
    }

    pub(crate) fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub(crate) fn endpoint_mut(&mut self) -> &mut Endpoint {
        &mut self.endpoint
    }

    /// Stop the worker and wait for it: deliver this registration's own
    /// token on the private sender (no other module can forge or block the
    /// signal), close the queue, join. Frames accepted before the token are
    /// drained first; the join has no timeout.
    pub(crate) async fn teardown(self) {
        self.endpoint.deliver_shutdown(self.token).await;
        drop(self.endpoint);
        if let Err(err) = self.worker.await {
            // A panicking receive callback ends up here; the registration is
            // gone either way.
            warn!(module = %self.id, error = %err, "worker did not stop cleanly");
        }
    }
}
