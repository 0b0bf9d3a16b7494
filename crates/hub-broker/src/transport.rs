//! # Pub/Sub Transport
//!
//! One bounded inbound queue per registered module, fed from a single
//! fan-out point. Filtering is the transport's responsibility: an endpoint
//! accepts a data frame only when the frame's source is in the endpoint's
//! subscription set, which the broker's link table maintains.
//!
//! Control and data travel on the same queue but as distinct [`Frame`]
//! variants, so a payload can never collide with the shutdown signal.

use std::collections::HashSet;

use bytes::Bytes;
use hub_types::ModuleId;
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

/// A value unique to one module registration instance, used to signal its
/// worker to terminate cooperatively over the same queue used for data.
///
/// Re-issued on every registration, even for the same module identity, so a
/// token from a previous incarnation can never stop the current worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ShutdownToken(Uuid);

impl ShutdownToken {
    /// Issue a token for a new registration instance.
    pub(crate) fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

/// One unit on a module's inbound queue.
#[derive(Debug, Clone)]
pub(crate) enum Frame {
    /// An encoded [`Envelope`](crate::Envelope).
    Data(Bytes),
    /// Cooperative stop signal for the owning worker.
    Shutdown(ShutdownToken),
}

/// Sending half of one module's inbound queue, together with the
/// subscription set that gates data delivery to it.
#[derive(Debug)]
pub(crate) struct Endpoint {
    sink: ModuleId,
    tx: mpsc::Sender<Frame>,
    accept: HashSet<ModuleId>,
}

/// Open an inbound queue for `sink`. Returns the filtered sending half and
/// the receiver the worker will own.
pub(crate) fn inbound_channel(
    sink: ModuleId,
    capacity: usize,
) -> (Endpoint, mpsc::Receiver<Frame>) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        Endpoint {
            sink,
            tx,
            accept: HashSet::new(),
        },
        rx,
    )
}

impl Endpoint {
    /// Start accepting data frames from `source`. Returns `false` when the
    /// subscription already existed.
    pub(crate) fn subscribe(&mut self, source: ModuleId) -> bool {
        self.accept.insert(source)
    }

    /// Stop accepting data frames from `source`. Returns `false` when there
    /// was no such subscription.
    pub(crate) fn unsubscribe(&mut self, source: ModuleId) -> bool {
        self.accept.remove(&source)
    }

    /// Whether data from `source` currently passes the filter.
    pub(crate) fn is_subscribed(&self, source: ModuleId) -> bool {
        self.accept.contains(&source)
    }

    /// Non-blocking delivery of one data frame. The frame is dropped when the
    /// queue is full or the worker is gone.
    fn deliver(&self, wire: Bytes) -> bool {
        match self.tx.try_send(Frame::Data(wire)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(sink = %self.sink, "inbound queue full, dropping message");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(sink = %self.sink, "inbound queue closed, dropping message");
                false
            }
        }
    }

    /// Deliver the stop signal, bypassing the subscription filter.
    ///
    /// Awaited rather than attempted: the frame queues behind any data
    /// frames already accepted, so those are drained before the worker
    /// stops. Cooperative and untimed by design.
    pub(crate) async fn deliver_shutdown(&self, token: ShutdownToken) {
        // A worker that already exited has dropped the receiver; nothing to
        // signal then.
        let _ = self.tx.send(Frame::Shutdown(token)).await;
    }
}

/// Result of one fan-out pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FanoutReport {
    pub(crate) delivered: u64,
    pub(crate) dropped: u64,
}

/// Hand one encoded envelope to every endpoint subscribed to `source`.
///
/// The buffer is reference-counted, so each delivery is a cheap clone of the
/// same allocation.
pub(crate) fn fan_out<'a, I>(endpoints: I, source: ModuleId, wire: &Bytes) -> FanoutReport
where
    I: Iterator<Item = &'a Endpoint>,
{
    let mut report = FanoutReport::default();
    for endpoint in endpoints {
        if !endpoint.is_subscribed(source) {
            continue;
        }
        if endpoint.deliver(wire.clone()) {
            report.delivered += 1;
        } else {
            report.dropped += 1;
        }
    }
    report
}
