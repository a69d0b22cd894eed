//! Log sampling.
//!
//! # Responsibilities
//! - Throttle duplicate log lines under bursty load
//! - Surface every suppressed event through a synchronous drop hook
//! - Wrap an injected sink; callers only pass events through
//!
//! # Design Decisions
//! - Per-key window state: first `initial` events of a window emit, then one
//!   of every `thereafter`
//! - A gap longer than the tick interval resets the window, so
//!   sustained-but-gapped traffic re-enters the initial-burst regime
//! - Window entries live in a sharded map; each decision's read-modify-write
//!   serializes on its shard

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::SamplingConfig;

/// Levels understood by the wrapped sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// One leveled, keyed event on its way to the sink.
#[derive(Debug, Clone)]
pub struct LogEvent<'a> {
    pub level: Level,
    pub key: &'a str,
    pub message: &'a str,
}

/// Hook invoked synchronously for every suppressed event.
pub type DropHook = Arc<dyn Fn(&LogEvent<'_>) + Send + Sync>;

struct Window {
    seen: u64,
    last_event: Instant,
}

/// Burst throttle over keyed log events.
pub struct LogSampler {
    initial: u64,
    thereafter: u64,
    tick: Duration,
    windows: DashMap<String, Window>,
    drop_hook: Option<DropHook>,
}

impl LogSampler {
    pub fn new(config: &SamplingConfig) -> Self {
        Self {
            initial: config.initial,
            thereafter: config.thereafter.max(1),
            tick: Duration::from_millis(config.tick_millis),
            windows: DashMap::new(),
            drop_hook: None,
        }
    }

    /// Attach a hook that fires once per suppressed event, unbatched.
    pub fn with_drop_hook(mut self, hook: DropHook) -> Self {
        self.drop_hook = Some(hook);
        self
    }

    /// Decide whether `event` should reach the sink.
    pub fn should_emit(&self, event: &LogEvent<'_>) -> bool {
        let now = Instant::now();

        let seen = {
            let mut window = self
                .windows
                .entry(event.key.to_string())
                .or_insert_with(|| Window {
                    seen: 0,
                    last_event: now,
                });

            if now.duration_since(window.last_event) > self.tick {
                window.seen = 0;
            }
            window.seen += 1;
            window.last_event = now;
            window.seen
            // Shard lock releases here, before the hook runs.
        };

        if seen <= self.initial || (seen - self.initial) % self.thereafter == 0 {
            true
        } else {
            if let Some(hook) = &self.drop_hook {
                hook(event);
            }
            false
        }
    }

    /// Number of live sample windows.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

/// Destination for events that pass sampling.
pub trait LogSink: Send + Sync {
    /// Emit one leveled, keyed event.
    fn emit(&self, event: &LogEvent<'_>);
}

/// Sink that forwards to the process-wide tracing subscriber.
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, event: &LogEvent<'_>) {
        match event.level {
            Level::Debug => tracing::debug!(key = event.key, "{}", event.message),
            Level::Info => tracing::info!(key = event.key, "{}", event.message),
            Level::Warn => tracing::warn!(key = event.key, "{}", event.message),
            Level::Error => tracing::error!(key = event.key, "{}", event.message),
        }
    }
}

/// A sink guarded by a sampler.
pub struct SampledLogger {
    sampler: LogSampler,
    sink: Arc<dyn LogSink>,
}

impl SampledLogger {
    pub fn new(sampler: LogSampler, sink: Arc<dyn LogSink>) -> Self {
        Self { sampler, sink }
    }

    /// Pass one event through the sampler to the sink.
    pub fn log(&self, level: Level, key: &str, message: &str) {
        let event = LogEvent { level, key, message };
        if self.sampler.should_emit(&event) {
            self.sink.emit(&event);
        }
    }

    pub fn sampler(&self) -> &LogSampler {
        &self.sampler
    }
}
