//! # Worker Loop
//!
//! The receive/dispatch/shutdown state machine run on a dedicated task per
//! module registration. Blocking receive, no timeout; cancellation is purely
//! cooperative via the registration's private shutdown frame. Decode failures
//! drop the one message and the loop survives; a closed queue is an implicit
//! stop, not an error. The task's return value is uniformly `()` — its joiner
//! cannot tell an internal failure from a normal shutdown.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use hub_types::{BusMessage, ModuleId};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::broker::BrokerStats;
use crate::envelope::Envelope;
use crate::module::Module;
use crate::transport::{Frame, ShutdownToken};

/// Everything one worker owns.
pub(crate) struct WorkerContext<M: BusMessage> {
    pub(crate) id: ModuleId,
    pub(crate) module: Arc<dyn Module<M>>,
    pub(crate) token: ShutdownToken,
    pub(crate) inbound: mpsc::Receiver<Frame>,
    pub(crate) stats: Arc<BrokerStats>,
}

/// Run the loop to completion. Spawned once per registration; subscription
/// state is already in place before this starts, so there is no setup phase.
pub(crate) async fn run<M: BusMessage>(mut ctx: WorkerContext<M>) {
    debug!(module = %ctx.id, "worker running");
    loop {
        let Some(frame) = ctx.inbound.recv().await else {
            // Queue torn down without a shutdown frame: implicit stop.
            break;
        };
        match frame {
            Frame::Shutdown(token) if token == ctx.token => break,
            Frame::Shutdown(_) => {
                // Token from another registration instance; only our own
                // stops this worker.
                warn!(module = %ctx.id, "ignoring stale shutdown token");
            }
            Frame::Data(wire) => dispatch(&ctx, wire).await,
        }
    }
    debug!(module = %ctx.id, "worker stopped");
}

async fn dispatch<M: BusMessage>(ctx: &WorkerContext<M>, wire: bytes::Bytes) {
    let envelope = match Envelope::decode(wire) {
        Ok(envelope) => envelope,
        Err(err) => {
            ctx.stats.dropped_decode.fetch_add(1, Ordering::Relaxed);
            warn!(module = %ctx.id, error = %err, "dropping undecodable envelope");
            return;
        }
    };
    let message = match M::decode(&envelope.payload) {
        Ok(message) => message,
        Err(err) => {
            ctx.stats.dropped_decode.fetch_add(1, Ordering::Relaxed);
            warn!(
                module = %ctx.id,
                source = %envelope.source,
                error = %err,
                "dropping undecodable message"
            );
            return;
        }
    };
    debug!(module = %ctx.id, source = %envelope.source, "dispatching message");
    ctx.module.receive(ctx.id, message).await;
}
