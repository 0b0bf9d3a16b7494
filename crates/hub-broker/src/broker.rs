//! # Broker Core
//!
//! Owns the registry of module registrations and the fan-out point. The
//! handle is shared ownership: cloning it shares the broker, and
//! [`shutdown`](Broker::shutdown) is the explicit teardown that removes every
//! remaining registration through the same path as
//! [`remove_module`](Broker::remove_module), so no worker is ever abandoned.
//!
//! The broker owns no task of its own; every operation executes on the
//! caller's task. Only structural mutations hold the registry lock for their
//! duration — `publish` takes it transiently around the fan-out.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use hub_types::{BusMessage, ModuleId};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::BrokerConfig;
use crate::envelope::Envelope;
use crate::error::{BrokerError, LinkError, PublishError};
use crate::module::ModuleDescriptor;
use crate::registration::ModuleRegistration;
use crate::transport;

/// Delivery counters, shared with every worker.
#[derive(Debug, Default)]
pub(crate) struct BrokerStats {
    pub(crate) published: AtomicU64,
    pub(crate) delivered: AtomicU64,
    pub(crate) dropped_capacity: AtomicU64,
    pub(crate) dropped_decode: AtomicU64,
}

/// Point-in-time copy of the broker's delivery counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Publish calls that reached the fan-out point.
    pub published: u64,
    /// Frames accepted onto sink queues.
    pub delivered: u64,
    /// Frames dropped because a sink queue was full or gone.
    pub dropped_capacity: u64,
    /// Frames dropped by a worker because they did not decode.
    pub dropped_decode: u64,
}

struct BrokerInner {
    /// Ordered registry; module counts are small, lookups are linear scans.
    registry: Mutex<Vec<ModuleRegistration>>,
    config: BrokerConfig,
    closed: AtomicBool,
    stats: Arc<BrokerStats>,
}

/// Shared-ownership handle to one broker instance.
///
/// Generic over the message type it routes; the broker never looks inside a
/// message beyond the [`BusMessage`] codec contract.
pub struct Broker<M: BusMessage> {
    inner: Arc<BrokerInner>,
    _message: PhantomData<fn() -> M>,
}

impl<M: BusMessage> Clone for Broker<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _message: PhantomData,
        }
    }
}

impl<M: BusMessage> Default for Broker<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: BusMessage> Broker<M> {
    /// Create a broker with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BrokerConfig::default())
    }

    /// Create a broker with the given configuration.
    #[must_use]
    pub fn with_config(config: BrokerConfig) -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                registry: Mutex::new(Vec::new()),
                config,
                closed: AtomicBool::new(false),
                stats: Arc::new(BrokerStats::default()),
            }),
            _message: PhantomData,
        }
    }

    fn ensure_open(&self) -> Result<(), BrokerError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(BrokerError::Closed);
        }
        Ok(())
    }

    /// Register a module and start its worker.
    ///
    /// The registration is fully built — fresh shutdown token, subscribed
    /// queue, running worker — before the registry is touched, so a
    /// half-made registration is never observable. A duplicate identity is
    /// rolled back through the normal teardown path.
    pub async fn add_module(&self, descriptor: ModuleDescriptor<M>) -> Result<(), BrokerError> {
        self.ensure_open()?;
        if descriptor.id.is_nil() {
            return Err(BrokerError::InvalidArgument("module id must not be nil"));
        }

        let registration = ModuleRegistration::spawn(
            descriptor.id,
            descriptor.module,
            self.inner.config.channel_capacity,
            Arc::clone(&self.inner.stats),
        );

        let mut registry = self.inner.registry.lock().await;
        if registry.iter().any(|r| r.id() == descriptor.id) {
            drop(registry);
            registration.teardown().await;
            return Err(BrokerError::AlreadyRegistered(descriptor.id));
        }
        registry.push(registration);
        drop(registry);

        info!(module = %descriptor.id, "module registered");
        Ok(())
    }

    /// Deregister a module: signal its worker with the registration's own
    /// shutdown token and wait for it to stop.
    ///
    /// Frames already queued at the sink are delivered before the worker
    /// stops. Blocks without timeout while the worker finishes an
    /// in-progress receive; a callback that never returns blocks this call
    /// forever.
    pub async fn remove_module(&self, id: ModuleId) -> Result<(), BrokerError> {
        self.ensure_open()?;
        if id.is_nil() {
            return Err(BrokerError::InvalidArgument("module id must not be nil"));
        }

        let registration = {
            let mut registry = self.inner.registry.lock().await;
            let index = registry
                .iter()
                .position(|r| r.id() == id)
                .ok_or(BrokerError::NotFound(id))?;
            registry.remove(index)
        };
        // Joined outside the registry lock: the module may be publishing
        // from its own receive callback while its shutdown frame is queued,
        // and publish needs the lock.
        registration.teardown().await;

        info!(module = %id, "module removed");
        Ok(())
    }

    /// Let `sink` observe everything `source` publishes.
    ///
    /// Links are a set: at most one link per (source, sink) pair, and adding
    /// an existing pair is an error rather than a silent no-op.
    pub async fn add_link(&self, source: ModuleId, sink: ModuleId) -> Result<(), LinkError> {
        self.ensure_open()?;
        if source.is_nil() || sink.is_nil() {
            return Err(BrokerError::InvalidArgument("link ids must not be nil").into());
        }

        let mut registry = self.inner.registry.lock().await;
        if !registry.iter().any(|r| r.id() == source) {
            return Err(LinkError::UnknownSource(source));
        }
        let sink_registration = registry
            .iter_mut()
            .find(|r| r.id() == sink)
            .ok_or(LinkError::UnknownSink(sink))?;
        if !sink_registration.endpoint_mut().subscribe(source) {
            return Err(LinkError::AlreadyLinked { src: source, dst: sink });
        }
        drop(registry);

        debug!(%source, %sink, "link added");
        Ok(())
    }

    /// Remove the link from `source` to `sink`.
    pub async fn remove_link(&self, source: ModuleId, sink: ModuleId) -> Result<(), LinkError> {
        self.ensure_open()?;
        if source.is_nil() || sink.is_nil() {
            return Err(BrokerError::InvalidArgument("link ids must not be nil").into());
        }

        let mut registry = self.inner.registry.lock().await;
        if !registry.iter().any(|r| r.id() == source) {
            return Err(LinkError::UnknownSource(source));
        }
        let sink_registration = registry
            .iter_mut()
            .find(|r| r.id() == sink)
            .ok_or(LinkError::UnknownSink(sink))?;
        if !sink_registration.endpoint_mut().unsubscribe(source) {
            return Err(LinkError::NotLinked { src: source, dst: sink });
        }
        drop(registry);

        debug!(%source, %sink, "link removed");
        Ok(())
    }

    /// Publish one message on behalf of `source`.
    ///
    /// The message is borrowed only for the duration of serialization, which
    /// happens exactly once; the fan-out hands the same buffer to every
    /// linked sink. Never blocks on a recipient and never reports partial
    /// delivery — reaching zero sinks is success, and a sink under pressure
    /// drops the frame (counted, not surfaced).
    pub async fn publish(&self, source: ModuleId, message: &M) -> Result<(), PublishError> {
        self.ensure_open()?;
        if source.is_nil() {
            return Err(BrokerError::InvalidArgument("source id must not be nil").into());
        }

        // Serialize once, outside the registry lock.
        let payload = message.encode()?;
        let wire = Envelope::new(source, payload).encode();

        self.inner.stats.published.fetch_add(1, Ordering::Relaxed);
        let report = {
            let registry = self.inner.registry.lock().await;
            transport::fan_out(registry.iter().map(ModuleRegistration::endpoint), source, &wire)
        };

        self.inner
            .stats
            .delivered
            .fetch_add(report.delivered, Ordering::Relaxed);
        if report.dropped > 0 {
            self.inner
                .stats
                .dropped_capacity
                .fetch_add(report.dropped, Ordering::Relaxed);
            warn!(%source, dropped = report.dropped, "dropped frames during fan-out");
        }
        debug!(%source, delivered = report.delivered, "message published");
        Ok(())
    }

    /// Tear the broker down: remove every remaining registration through the
    /// same path as [`remove_module`](Broker::remove_module), then mark the
    /// broker closed. Returns only after every worker has fully terminated.
    /// Idempotent; subsequent operations fail with
    /// [`BrokerError::Closed`].
    pub async fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let drained: Vec<ModuleRegistration> = {
            let mut registry = self.inner.registry.lock().await;
            registry.drain(..).collect()
        };
        let count = drained.len();
        for registration in drained {
            registration.teardown().await;
        }

        info!(modules = count, "broker shut down");
    }

    /// Whether [`shutdown`](Broker::shutdown) has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Number of active module registrations.
    pub async fn module_count(&self) -> usize {
        self.inner.registry.lock().await.len()
    }

    /// Whether a link from `source` to `sink` currently exists.
    pub async fn is_linked(&self, source: ModuleId, sink: ModuleId) -> bool {
        self.inner
            .registry
            .lock()
            .await
            .iter()
            .find(|r| r.id() == sink)
            .is_some_and(|r| r.endpoint().is_subscribed(source))
    }

    /// Snapshot of the delivery counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        let stats = &self.inner.stats;
        StatsSnapshot {
            published: stats.published.load(Ordering::Relaxed),
            delivered: stats.delivered.load(Ordering::Relaxed),
            dropped_capacity: stats.dropped_capacity.load(Ordering::Relaxed),
            dropped_decode: stats.dropped_decode.load(Ordering::Relaxed),
        }
    }
}

impl<M: BusMessage> std::fmt::Debug for Broker<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
