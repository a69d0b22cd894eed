//! Request boundary behavior over a real listener.

mod common;

use std::sync::Arc;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;

use fib_service::config::ServiceConfig;
use fib_service::http::{AppState, HttpServer};
use fib_service::lifecycle::Shutdown;
use fib_service::observability::metrics::GaugeRegistry;

/// Start the service on an ephemeral port; returns its base URL.
async fn start_service() -> (String, Arc<Shutdown>) {
    let h = common::harness();

    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();

    let shutdown = Arc::new(Shutdown::new());
    let state = AppState {
        engine: h.engine,
        spans: h.spans,
        instruments: h.instruments,
        gauges: Arc::new(GaugeRegistry::new()),
        prometheus: PrometheusBuilder::new().build_recorder().handle(),
        shutdown: shutdown.clone(),
        service_name: "test".to_string(),
        max_n: config.engine.max_n,
        started_at: Instant::now(),
    };

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config, state);
    tokio::spawn(async move {
        server.run(listener).await.unwrap();
    });

    (format!("http://{addr}"), shutdown)
}

#[tokio::test]
async fn test_fib_endpoint_renders_result_with_newline() {
    let (base, shutdown) = start_service().await;

    let response = reqwest::get(format!("{base}/fib?n=7")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "21\n");

    // The root path serves the same handler.
    let body = reqwest::get(format!("{base}/?n=4"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "5\n");

    shutdown.trigger();
}

#[tokio::test]
async fn test_rejects_unusable_parameter() {
    let (base, shutdown) = start_service().await;

    for query in ["", "?n=abc", "?n=1&n=2", "?m=3", "?n=-1", "?n=9999"] {
        let response = reqwest::get(format!("{base}/fib{query}")).await.unwrap();
        assert_eq!(response.status(), 400, "query: {query:?}");
        assert_eq!(response.text().await.unwrap(), "couldn't parse index n");
    }

    shutdown.trigger();
}

#[tokio::test]
async fn test_status_and_metrics_endpoints() {
    let (base, shutdown) = start_service().await;

    reqwest::get(format!("{base}/fib?n=5")).await.unwrap();

    let status: serde_json::Value = reqwest::get(format!("{base}/status"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["status"], "operational");
    assert_eq!(status["service"], "test");
    // The n=5 tree holds 15 nodes.
    assert_eq!(status["invocations"].as_u64().unwrap(), 15);

    let response = reqwest::get(format!("{base}/metrics")).await.unwrap();
    assert_eq!(response.status(), 200);

    shutdown.trigger();
}
