//! # Runtime Flow Tests
//!
//! Loader-built module graphs exercised end to end: configuration in,
//! running hub out, with the error taxonomy a configuration author relies
//! on to tell bad wiring from bad modules.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use hub_broker::LinkError;
    use hub_runtime::{ConfigError, LoaderError, Runtime, RuntimeConfig};

    fn config(value: serde_json::Value) -> RuntimeConfig {
        serde_json::from_value(value).expect("test config should deserialize")
    }

    /// The demo graph: heartbeat -> relay -> printer, with a fast beat.
    fn demo_graph() -> RuntimeConfig {
        config(serde_json::json!({
            "modules": [
                { "name": "beat", "kind": "heartbeat", "args": { "interval_ms": 5 } },
                { "name": "hop",  "kind": "relay",     "args": { "tag": "hop" } },
                { "name": "out",  "kind": "printer" }
            ],
            "links": [
                { "source": "beat", "sink": "hop" },
                { "source": "hop",  "sink": "out" }
            ]
        }))
    }

    #[tokio::test]
    async fn test_demo_graph_flows_end_to_end() {
        let runtime = Runtime::build(demo_graph()).await.expect("build should succeed");
        assert!(runtime.module_id("beat").is_some());
        assert!(runtime.module_id("nonesuch").is_none());

        runtime.start().await.expect("start should succeed");

        // Each beat is delivered twice: heartbeat -> relay, relay -> printer.
        let broker = runtime.broker().clone();
        for _ in 0..400 {
            if broker.stats().delivered >= 6 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let stats = broker.stats();
        assert!(
            stats.delivered >= 6,
            "expected the graph to route beats, saw {stats:?}"
        );

        runtime.shutdown().await;
        assert!(broker.is_closed());
    }

    #[tokio::test]
    async fn test_duplicate_link_is_a_wiring_error() {
        let mut graph = demo_graph();
        graph.links.push(graph.links[0].clone());

        let err = Runtime::build(graph).await.unwrap_err();
        match err {
            LoaderError::Wiring {
                source_name,
                sink_name,
                cause,
            } => {
                assert_eq!(source_name, "beat");
                assert_eq!(sink_name, "hop");
                assert!(matches!(cause, LinkError::AlreadyLinked { .. }));
            }
            other => panic!("expected a wiring error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_kind_is_a_module_error() {
        let graph = config(serde_json::json!({
            "modules": [
                { "name": "mystery", "kind": "teleporter" }
            ]
        }));

        let err = Runtime::build(graph).await.unwrap_err();
        assert!(matches!(
            err,
            LoaderError::UnknownKind { ref name, ref kind } if name == "mystery" && kind == "teleporter"
        ));
    }

    #[tokio::test]
    async fn test_undeclared_link_is_a_config_error() {
        let mut graph = demo_graph();
        graph.links.push(hub_runtime::config::LinkEntry {
            source: "beat".into(),
            sink: "nowhere".into(),
        });

        let err = Runtime::build(graph).await.unwrap_err();
        assert!(matches!(
            err,
            LoaderError::Config(ConfigError::UndeclaredModule { .. })
        ));
    }

    #[tokio::test]
    async fn test_bad_module_args_unwind_the_graph() {
        let graph = config(serde_json::json!({
            "modules": [
                { "name": "out",  "kind": "printer" },
                { "name": "beat", "kind": "heartbeat", "args": { "interval_ms": "soon" } }
            ]
        }));

        // The printer registers first, then the heartbeat's create rejects
        // its arguments; the whole build unwinds rather than returning a
        // half-made graph.
        let err = Runtime::build(graph).await.unwrap_err();
        assert!(matches!(err, LoaderError::Create { ref name, .. } if name == "beat"));
    }
}
