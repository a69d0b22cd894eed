//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Build the process-wide instruments once at startup
//! - Track task invocations (exported counter + in-process tally)
//! - Hold pull callbacks for observable gauges
//! - Record boundary request latency
//!
//! # Metrics
//! - `fibonacci_requests_total` (counter): task invocations, by service/host
//! - `fib_tasks_live` (gauge, pulled): currently executing engine tasks
//! - `log_sampler_windows` (gauge, pulled): live log-sampler windows
//! - `http_request_duration_seconds` (histogram): boundary latency by status
//!
//! # Design Decisions
//! - Instruments are explicit objects passed by reference, never looked up
//!   through ambient globals, so tests can build their own
//! - Increments go through the `metrics` facade: with no recorder installed
//!   they are no-ops, so a telemetry outage never blocks or fails a caller
//! - Gauges are pull-based: callbacks registered once, invoked by whoever
//!   scrapes, with no collection loop of our own

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Counter};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

pub use metrics::Unit;

/// Counter name for task invocations.
pub const REQUESTS_TOTAL: &str = "fibonacci_requests_total";

/// Histogram name for boundary request latency.
pub const REQUEST_DURATION: &str = "http_request_duration_seconds";

/// Install the Prometheus recorder for this process.
///
/// Fatal on failure: the service refuses to start unobserved.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Register help text for the boundary metrics.
pub fn describe_http_metrics() {
    describe_histogram!(
        REQUEST_DURATION,
        Unit::Seconds,
        "Latency of requests handled at the HTTP boundary."
    );
}

/// Record one boundary request and its latency.
pub fn record_request(status: u16, start: Instant) {
    histogram!(REQUEST_DURATION, "status" => status.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Instruments shared by the engine and the request boundary.
///
/// Built once at startup. The exported counter carries the fixed service and
/// host labels on every increment; the atomic fields are the in-process view
/// that gauge callbacks and tests read without a scrape.
pub struct Instruments {
    requests: Counter,
    invocations: AtomicU64,
    live_tasks: AtomicI64,
}

impl Instruments {
    pub fn new(service_name: &str) -> Self {
        describe_counter!(
            REQUESTS_TOTAL,
            Unit::Count,
            "Total number of Fibonacci task invocations."
        );

        let host = std::env::var("HOSTNAME").unwrap_or_default();
        let requests = counter!(
            REQUESTS_TOTAL,
            "application" => service_name.to_string(),
            "container_id" => host
        );

        Self {
            requests,
            invocations: AtomicU64::new(0),
            live_tasks: AtomicI64::new(0),
        }
    }

    /// Count one task invocation. Never blocks: with no recorder installed
    /// the exported increment is a no-op, and the tally is a relaxed add.
    pub fn record_invocation(&self) {
        self.requests.increment(1);
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    /// In-process invocation tally since startup.
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }

    /// Currently executing engine tasks.
    pub fn live_tasks(&self) -> i64 {
        self.live_tasks.load(Ordering::Relaxed)
    }

    /// Mark one engine task live for the guard's lifetime.
    pub fn live_task(&self) -> LiveTask<'_> {
        self.live_tasks.fetch_add(1, Ordering::Relaxed);
        LiveTask { instruments: self }
    }
}

/// Holds one slot of the live-task gauge; released on drop.
pub struct LiveTask<'a> {
    instruments: &'a Instruments,
}

impl Drop for LiveTask<'_> {
    fn drop(&mut self) {
        self.instruments.live_tasks.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Callback returning the current value of an observable gauge.
///
/// Must be safe to invoke concurrently and must not block.
pub type GaugeCallback = Box<dyn Fn() -> i64 + Send + Sync>;

struct RegisteredGauge {
    name: &'static str,
    read: GaugeCallback,
}

/// Registry of pull-based gauges.
///
/// Callbacks are registered once at process start. `collect` runs them and
/// publishes the snapshots, so readings happen at the collector's cadence,
/// not the engine's.
pub struct GaugeRegistry {
    gauges: RwLock<Vec<RegisteredGauge>>,
}

impl GaugeRegistry {
    pub fn new() -> Self {
        Self {
            gauges: RwLock::new(Vec::new()),
        }
    }

    /// Register a pull callback under `name` with its unit and help text.
    pub fn register(
        &self,
        name: &'static str,
        unit: Unit,
        description: &'static str,
        read: GaugeCallback,
    ) {
        describe_gauge!(name, unit, description);
        self.gauges
            .write()
            .expect("gauge registry lock poisoned")
            .push(RegisteredGauge { name, read });
    }

    /// Invoke every callback once and publish the snapshots.
    pub fn collect(&self) {
        let gauges = self.gauges.read().expect("gauge registry lock poisoned");
        for entry in gauges.iter() {
            gauge!(entry.name).set((entry.read)() as f64);
        }
    }

    /// Number of registered gauges.
    pub fn len(&self) -> usize {
        self.gauges
            .read()
            .expect("gauge registry lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for GaugeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
