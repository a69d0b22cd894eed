//! Instrumented Concurrent Fibonacci Service
//!
//! A demonstration service built with Tokio and Axum: a recursive task
//! engine whose every node is independently traced and counted.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌────────────────────────────────────────────┐
//!                        │                FIB SERVICE                  │
//!                        │                                             │
//!     GET /fib?n=...     │  ┌─────────┐     ┌──────────────────────┐  │
//!     ───────────────────┼─▶│  http   │────▶│    task engine       │  │
//!                        │  │ server  │     │  fan-out / fan-in    │  │
//!                        │  └─────────┘     └──────────┬───────────┘  │
//!                        │                             │              │
//!                        │            ┌────────────────┴───────────┐  │
//!     result + newline   │            ▼                            ▼  │
//!     ◀──────────────────┼── span emitter                 counter /   │
//!                        │   (one span per node)          gauges      │
//!                        │                                             │
//!                        │  ┌────────────────────────────────────────┐│
//!                        │  │          Cross-Cutting Concerns         ││
//!                        │  │  config · log sampler · lifecycle       ││
//!                        │  └────────────────────────────────────────┘│
//!                        └────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fib_service::config::loader::load_config;
use fib_service::config::ServiceConfig;
use fib_service::engine::Engine;
use fib_service::http::{AppState, HttpServer};
use fib_service::lifecycle::Shutdown;
use fib_service::observability::logging::{LogSampler, SampledLogger, TracingSink};
use fib_service::observability::metrics::{self, GaugeRegistry, Instruments, Unit};
use fib_service::observability::tracing::{LogSpanExporter, SpanEmitter};

#[derive(Parser)]
#[command(name = "fib-service")]
#[command(about = "Instrumented concurrent Fibonacci service", long_about = None)]
struct Cli {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind address.
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fib_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("fib-service v{} starting", env!("CARGO_PKG_VERSION"));

    // Load configuration; an invalid file is fatal
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(listen) = cli.listen {
        config.listener.bind_address = listen;
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_n = config.engine.max_n,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    // Exporter construction is fatal: refuse to run unobserved
    let prometheus = metrics::install_recorder()?;
    metrics::describe_http_metrics();

    let instruments = Arc::new(Instruments::new(&config.observability.service_name));

    let sampler = LogSampler::new(&config.sampling).with_drop_hook(Arc::new(|event| {
        tracing::trace!(key = event.key, "Log event dropped");
    }));
    let logger = Arc::new(SampledLogger::new(sampler, Arc::new(TracingSink)));

    // Observable gauges: registered once here, pulled by the scrape
    let gauges = Arc::new(GaugeRegistry::new());
    {
        let instruments = instruments.clone();
        gauges.register(
            "fib_tasks_live",
            Unit::Count,
            "Number of task-engine invocations currently executing.",
            Box::new(move || instruments.live_tasks()),
        );
    }
    {
        let logger = logger.clone();
        gauges.register(
            "log_sampler_windows",
            Unit::Count,
            "Number of live log-sampler windows.",
            Box::new(move || logger.sampler().tracked_keys() as i64),
        );
    }

    let spans = SpanEmitter::new(Arc::new(LogSpanExporter));
    let engine = Engine::new(spans.clone(), instruments.clone(), logger);
    let shutdown = Arc::new(Shutdown::new());

    // Bind TCP listener; traffic starts only once everything else is wired
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    let state = AppState {
        engine,
        spans,
        instruments,
        gauges,
        prometheus,
        shutdown,
        service_name: config.observability.service_name.clone(),
        max_n: config.engine.max_n,
        started_at: Instant::now(),
    };

    let server = HttpServer::new(config, state);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
