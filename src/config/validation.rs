//! Configuration validation.
//!
//! Semantic checks on top of serde's syntactic ones. Returns every problem
//! found, not just the first, so a bad config can be fixed in one pass.

use std::net::SocketAddr;

use crate::config::schema::ServiceConfig;

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting all errors.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listener.bind_address".to_string(),
            message: format!("not a valid socket address: {}", config.listener.bind_address),
        });
    }

    if config.listener.max_connections == 0 {
        errors.push(ValidationError {
            field: "listener.max_connections".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    // 2^n tasks per request; anything past this is a typo, not a workload.
    if config.engine.max_n > 40 {
        errors.push(ValidationError {
            field: "engine.max_n".to_string(),
            message: format!("{} would spawn an unreasonable task tree (limit 40)", config.engine.max_n),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError {
            field: "timeouts.request_secs".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    if config.observability.service_name.is_empty() {
        errors.push(ValidationError {
            field: "observability.service_name".to_string(),
            message: "must not be empty".to_string(),
        });
    }

    if config.sampling.thereafter == 0 {
        errors.push(ValidationError {
            field: "sampling.thereafter".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    if config.sampling.tick_millis == 0 {
        errors.push(ValidationError {
            field: "sampling.tick_millis".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
