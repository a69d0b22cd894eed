//! HTTP server setup and the request boundary.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (timeout, concurrency limit, request ID, tracing)
//! - Parse the one query parameter and invoke the task engine
//! - Expose Prometheus metrics and a status endpoint
//! - Graceful shutdown on Ctrl+C
//!
//! # Design Decisions
//! - Input errors stop here; the engine only ever sees valid n
//! - The metrics scrape is the gauge collector: callbacks are pulled right
//!   before rendering

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tokio::net::TcpListener;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::engine::{Engine, TaskContext};
use crate::http::request::RequestIdLayer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics::{self, GaugeRegistry, Instruments};
use crate::observability::tracing::SpanEmitter;

/// Fixed body returned for any unusable `n` parameter.
const PARSE_ERROR_BODY: &str = "couldn't parse index n";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Engine,
    pub spans: SpanEmitter,
    pub instruments: Arc<Instruments>,
    pub gauges: Arc<GaugeRegistry>,
    pub prometheus: PrometheusHandle,
    pub shutdown: Arc<Shutdown>,
    pub service_name: String,
    pub max_n: u64,
    pub started_at: Instant,
}

/// HTTP server for the service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
    shutdown: Arc<Shutdown>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and state.
    pub fn new(config: ServiceConfig, state: AppState) -> Self {
        let shutdown = state.shutdown.clone();
        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            shutdown,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/", get(fib_handler))
            .route("/fib", get(fib_handler))
            .route("/status", get(status_handler));

        if config.observability.metrics_enabled {
            router = router.route("/metrics", get(metrics_handler));
        }

        router
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(self.shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

/// Main request handler: parse `n`, run the task tree, render the result.
async fn fib_handler(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    let start = Instant::now();

    let n = match parse_index(query.as_deref()) {
        Some(n) if n <= state.max_n => n,
        Some(n) => {
            tracing::warn!(n, max_n = state.max_n, "Index above configured ceiling");
            metrics::record_request(400, start);
            return (StatusCode::BAD_REQUEST, PARSE_ERROR_BODY).into_response();
        }
        None => {
            metrics::record_request(400, start);
            return (StatusCode::BAD_REQUEST, PARSE_ERROR_BODY).into_response();
        }
    };

    let (root_ref, root_span) = state.spans.begin(None, "root", [("parameter", n as i64)]);
    let ctx = TaskContext::root(state.shutdown.child_token()).child_of(root_ref);

    let result = state.engine.invoke(&ctx, n).await;

    root_span.finish([("result", result as i64)]);
    metrics::record_request(200, start);

    (StatusCode::OK, format!("{result}\n")).into_response()
}

/// Require exactly one occurrence of `n` and a non-negative integer value.
fn parse_index(query: Option<&str>) -> Option<u64> {
    let query = query?;
    let mut values = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .filter(|(key, _)| *key == "n")
        .map(|(_, value)| value);

    match (values.next(), values.next()) {
        (Some(value), None) => value.parse().ok(),
        _ => None,
    }
}

#[derive(Serialize)]
pub struct SystemStatus {
    pub service: String,
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub invocations: u64,
}

async fn status_handler(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        service: state.service_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        invocations: state.instruments.invocations(),
    })
}

/// Prometheus exposition. The scrape is the external collector, so every
/// registered gauge callback is pulled before rendering.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    state.gauges.collect();
    state.prometheus.render().into_response()
}

/// Wait for shutdown (Ctrl+C or an internal trigger).
async fn shutdown_signal(shutdown: Arc<Shutdown>) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            shutdown.trigger();
        }
        _ = shutdown.triggered() => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index_accepts_single_n() {
        assert_eq!(parse_index(Some("n=7")), Some(7));
        assert_eq!(parse_index(Some("other=1&n=12")), Some(12));
    }

    #[test]
    fn test_parse_index_rejects_bad_input() {
        assert_eq!(parse_index(None), None);
        assert_eq!(parse_index(Some("")), None);
        assert_eq!(parse_index(Some("m=7")), None);
        assert_eq!(parse_index(Some("n=seven")), None);
        assert_eq!(parse_index(Some("n=-3")), None);
        // Exactly one occurrence is required.
        assert_eq!(parse_index(Some("n=1&n=2")), None);
    }
}
