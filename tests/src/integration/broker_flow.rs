//! # Broker Flow Tests
//!
//! End-to-end behavior of the broker core across registration, routing,
//! ordering, pressure, and shutdown — everything a module host can observe
//! through the public contract.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;
    use tokio::sync::{Notify, Semaphore};
    use tokio::time::timeout;

    use hub_broker::{Broker, BrokerError, LinkError, Module, ModuleDescriptor, ModuleError};
    use hub_types::ModuleId;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    /// Sink that appends every delivered payload to a shared list.
    #[derive(Default)]
    struct Recorder {
        seen: parking_lot::Mutex<Vec<Bytes>>,
    }

    impl Recorder {
        fn count(&self) -> usize {
            self.seen.lock().len()
        }
    }

    #[async_trait]
    impl Module<Bytes> for Recorder {
        async fn create(
            &self,
            _broker: Broker<Bytes>,
            _config: &serde_json::Value,
        ) -> Result<ModuleId, ModuleError> {
            Ok(ModuleId::generate())
        }

        async fn receive(&self, _id: ModuleId, message: Bytes) {
            self.seen.lock().push(message);
        }

        async fn destroy(&self, _id: ModuleId) {}
    }

    /// Sink that parks inside `receive` until released, recording whether the
    /// callback ran to completion.
    struct Gate {
        entered: Notify,
        release: Semaphore,
        completed: AtomicBool,
    }

    impl Gate {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                entered: Notify::new(),
                release: Semaphore::new(0),
                completed: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl Module<Bytes> for Gate {
        async fn create(
            &self,
            _broker: Broker<Bytes>,
            _config: &serde_json::Value,
        ) -> Result<ModuleId, ModuleError> {
            Ok(ModuleId::generate())
        }

        async fn receive(&self, _id: ModuleId, _message: Bytes) {
            self.entered.notify_one();
            let permit = self
                .release
                .acquire()
                .await
                .expect("gate semaphore should stay open");
            permit.forget();
            self.completed.store(true, Ordering::SeqCst);
        }

        async fn destroy(&self, _id: ModuleId) {}
    }

    async fn register(broker: &Broker<Bytes>, module: Arc<dyn Module<Bytes>>) -> ModuleId {
        let id = ModuleId::generate();
        broker
            .add_module(ModuleDescriptor::new(id, module))
            .await
            .expect("registration should succeed");
        id
    }

    async fn wait_until(what: &str, mut check: impl FnMut() -> bool) {
        for _ in 0..400 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("timed out waiting until {what}");
    }

    // =========================================================================
    // INTEGRATION TESTS: REGISTRATION AND ROUTING
    // =========================================================================

    /// Scenario: link M1 -> M2, publish "hello" from M1. Exactly M2 hears
    /// it, exactly once, content-equal; M1 and an unlinked M3 hear nothing.
    #[tokio::test]
    async fn test_publish_routes_exactly_the_links() {
        let broker: Broker<Bytes> = Broker::new();
        let m1_sink = Arc::new(Recorder::default());
        let m2_sink = Arc::new(Recorder::default());
        let m3_sink = Arc::new(Recorder::default());
        let m1 = register(&broker, m1_sink.clone()).await;
        let m2 = register(&broker, m2_sink.clone()).await;
        let _m3 = register(&broker, m3_sink.clone()).await;

        broker.add_link(m1, m2).await.unwrap();
        let message = Bytes::from_static(b"hello");
        broker.publish(m1, &message).await.unwrap();

        wait_until("m2 receives the message", || m2_sink.count() == 1).await;
        assert_eq!(&*m2_sink.seen.lock(), &[message]);
        // Give stray deliveries a moment to show up before asserting absence.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(m2_sink.count(), 1, "delivered exactly once");
        assert_eq!(m1_sink.count(), 0, "publisher does not hear itself");
        assert_eq!(m3_sink.count(), 0, "unlinked module hears nothing");

        broker.shutdown().await;
    }

    /// Scenario: add then remove a module; a second remove reports
    /// not-found and the registry is back where it started.
    #[tokio::test]
    async fn test_remove_twice_reports_not_found() {
        let broker: Broker<Bytes> = Broker::new();
        let id = register(&broker, Arc::new(Recorder::default())).await;
        assert_eq!(broker.module_count().await, 1);

        broker.remove_module(id).await.unwrap();
        assert_eq!(
            broker.remove_module(id).await,
            Err(BrokerError::NotFound(id))
        );
        assert_eq!(broker.module_count().await, 0);

        broker.shutdown().await;
    }

    /// Scenario: linking an unregistered identity fails with the wiring
    /// error and mutates no subscription.
    #[tokio::test]
    async fn test_bad_wiring_leaves_subscriptions_alone() {
        let broker: Broker<Bytes> = Broker::new();
        let sink = Arc::new(Recorder::default());
        let known = register(&broker, sink.clone()).await;
        let unknown = ModuleId::generate();

        assert_eq!(
            broker.add_link(unknown, known).await,
            Err(LinkError::UnknownSource(unknown))
        );
        assert!(!broker.is_linked(unknown, known).await);

        // Publishing under the unknown identity reaches nothing.
        broker
            .publish(unknown, &Bytes::from_static(b"ghost"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sink.count(), 0);

        broker.shutdown().await;
    }

    /// Scenario: a module with no links publishes into the void; publish
    /// still succeeds.
    #[tokio::test]
    async fn test_unheard_publish_is_ok() {
        let broker: Broker<Bytes> = Broker::new();
        let source = register(&broker, Arc::new(Recorder::default())).await;

        broker
            .publish(source, &Bytes::from_static(b"tree falls"))
            .await
            .unwrap();

        let stats = broker.stats();
        assert_eq!(stats.published, 1);
        assert_eq!(stats.delivered, 0);
        broker.shutdown().await;
    }

    // =========================================================================
    // INTEGRATION TESTS: ORDERING AND PRESSURE
    // =========================================================================

    /// Messages from one source reach one sink in publish order.
    #[tokio::test]
    async fn test_fifo_per_source_sink_pair() {
        let broker: Broker<Bytes> = Broker::new();
        let sink = Arc::new(Recorder::default());
        let source = register(&broker, Arc::new(Recorder::default())).await;
        let sink_id = register(&broker, sink.clone()).await;
        broker.add_link(source, sink_id).await.unwrap();

        const COUNT: u64 = 100;
        for seq in 0..COUNT {
            broker
                .publish(source, &Bytes::from(seq.to_be_bytes().to_vec()))
                .await
                .unwrap();
        }

        wait_until("all messages arrive", || sink.count() == COUNT as usize).await;
        let seen = sink.seen.lock();
        for (expected, payload) in seen.iter().enumerate() {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(payload);
            assert_eq!(u64::from_be_bytes(buf), expected as u64, "FIFO violated");
        }
        drop(seen);

        broker.shutdown().await;
    }

    /// Frames accepted before `remove_module` are drained to the module
    /// before its worker stops.
    #[tokio::test]
    async fn test_in_flight_messages_survive_removal() {
        let broker: Broker<Bytes> = Broker::new();
        let sink = Arc::new(Recorder::default());
        let source = register(&broker, Arc::new(Recorder::default())).await;
        let sink_id = register(&broker, sink.clone()).await;
        broker.add_link(source, sink_id).await.unwrap();

        const COUNT: usize = 50;
        for seq in 0..COUNT {
            broker
                .publish(source, &Bytes::from(seq.to_string().into_bytes()))
                .await
                .unwrap();
        }
        // The shutdown frame queues behind all fifty data frames.
        broker.remove_module(sink_id).await.unwrap();

        assert_eq!(sink.count(), COUNT, "queued frames were dropped by removal");
        broker.shutdown().await;
    }

    /// A sink that stops draining loses frames beyond its queue capacity,
    /// and every published frame is accounted for as delivered or dropped.
    #[tokio::test]
    async fn test_overflowing_sink_drops_frames() {
        let broker: Broker<Bytes> =
            Broker::with_config(hub_broker::BrokerConfig::default().with_channel_capacity(2));
        let gate = Gate::new();
        let source = register(&broker, Arc::new(Recorder::default())).await;
        let sink_id = register(&broker, gate.clone()).await;
        broker.add_link(source, sink_id).await.unwrap();

        // First frame parks the worker inside receive.
        broker.publish(source, &Bytes::from_static(b"0")).await.unwrap();
        timeout(Duration::from_secs(1), gate.entered.notified())
            .await
            .expect("worker should enter receive");

        const TOTAL: u64 = 10;
        for seq in 1..TOTAL {
            broker
                .publish(source, &Bytes::from(seq.to_string().into_bytes()))
                .await
                .unwrap();
        }

        let stats = broker.stats();
        assert!(stats.dropped_capacity > 0, "expected overflow drops");
        assert_eq!(stats.delivered + stats.dropped_capacity, TOTAL);

        // Let the worker drain what was accepted, then tear down.
        gate.release.add_permits(TOTAL as usize);
        broker.shutdown().await;
    }

    // =========================================================================
    // INTEGRATION TESTS: SHUTDOWN
    // =========================================================================

    /// Scenario: shutdown while a receive callback is mid-execution blocks
    /// until the callback returns, then completes with no worker left.
    #[tokio::test]
    async fn test_shutdown_waits_for_mid_execution_receive() {
        let broker: Broker<Bytes> = Broker::new();
        let gate = Gate::new();
        let source = register(&broker, Arc::new(Recorder::default())).await;
        let sink_id = register(&broker, gate.clone()).await;
        broker.add_link(source, sink_id).await.unwrap();

        broker.publish(source, &Bytes::from_static(b"x")).await.unwrap();
        timeout(Duration::from_secs(1), gate.entered.notified())
            .await
            .expect("worker should enter receive");

        // Release the callback shortly after shutdown starts joining.
        let releaser = {
            let gate = gate.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                gate.release.add_permits(1);
            })
        };

        broker.shutdown().await;
        assert!(
            gate.completed.load(Ordering::SeqCst),
            "shutdown returned before the callback finished"
        );
        assert!(broker.is_closed());
        releaser.await.unwrap();
    }

    /// The same identity can register again after removal; the new
    /// registration gets a working delivery path.
    #[tokio::test]
    async fn test_identity_can_register_again_after_removal() {
        let broker: Broker<Bytes> = Broker::new();
        let source = register(&broker, Arc::new(Recorder::default())).await;

        let first = Arc::new(Recorder::default());
        let sink_id = ModuleId::generate();
        broker
            .add_module(ModuleDescriptor::new(sink_id, first.clone()))
            .await
            .unwrap();
        broker.remove_module(sink_id).await.unwrap();

        let second = Arc::new(Recorder::default());
        broker
            .add_module(ModuleDescriptor::new(sink_id, second.clone()))
            .await
            .unwrap();
        broker.add_link(source, sink_id).await.unwrap();
        broker.publish(source, &Bytes::from_static(b"again")).await.unwrap();

        wait_until("the new registration receives", || second.count() == 1).await;
        assert_eq!(first.count(), 0);
        broker.shutdown().await;
    }
}
