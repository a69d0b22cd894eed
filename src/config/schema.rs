//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Task engine settings.
    pub engine: EngineConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Log sampling settings.
    pub sampling: SamplingConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Task engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest accepted input. The task tree grows exponentially with n,
    /// so requests above this are rejected at the boundary.
    pub max_n: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_n: 30 }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Service name attached to every instrument reading and span.
    pub service_name: String,

    /// Enable the Prometheus exposition endpoint.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            service_name: "fibonacci".to_string(),
            metrics_enabled: true,
        }
    }
}

/// Log sampling configuration.
///
/// The first `initial` events in a window always emit; after that only every
/// `thereafter`-th does. A gap longer than `tick_millis` between events
/// resets the window.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Events emitted unconditionally at the start of each window.
    pub initial: u64,

    /// After the initial burst, emit one of every `thereafter` events.
    pub thereafter: u64,

    /// Window reset interval in milliseconds.
    pub tick_millis: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            initial: 3,
            thereafter: 3,
            tick_millis: 1_000,
        }
    }
}
