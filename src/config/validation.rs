//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check that the poll interval fits inside the exchange deadline
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::BridgeConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("backend.host must not be empty")]
    EmptyBackendHost,

    #[error("backend.default_port must not be 0")]
    ZeroDefaultPort,

    #[error("route key must not be empty")]
    EmptyRouteKey,

    #[error("route `{topic}` maps to port 0")]
    ZeroRoutePort { topic: String },

    #[error("timeouts.{field} must be greater than 0")]
    ZeroTimeout { field: &'static str },

    #[error("timeouts.poll_interval_ms ({poll_ms}) exceeds timeouts.deadline_ms ({deadline_ms})")]
    PollLongerThanDeadline { poll_ms: u64, deadline_ms: u64 },

    #[error("exchange.{field} must be greater than 0")]
    ZeroLimit { field: &'static str },

    #[error("observability.metrics_address `{0}` is not a socket address")]
    BadMetricsAddress(String),
}

/// Check every semantic rule and collect all violations.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backend.host.trim().is_empty() {
        errors.push(ValidationError::EmptyBackendHost);
    }
    if config.backend.default_port == 0 {
        errors.push(ValidationError::ZeroDefaultPort);
    }

    for (topic, port) in &config.routes {
        if topic.is_empty() {
            errors.push(ValidationError::EmptyRouteKey);
        }
        if *port == 0 {
            errors.push(ValidationError::ZeroRoutePort {
                topic: topic.clone(),
            });
        }
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("connect_ms", timeouts.connect_ms),
        ("deadline_ms", timeouts.deadline_ms),
        ("poll_interval_ms", timeouts.poll_interval_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout { field });
        }
    }
    if timeouts.poll_interval_ms > timeouts.deadline_ms {
        errors.push(ValidationError::PollLongerThanDeadline {
            poll_ms: timeouts.poll_interval_ms,
            deadline_ms: timeouts.deadline_ms,
        });
    }

    let exchange = &config.exchange;
    for (field, value) in [
        ("read_chunk_size", exchange.read_chunk_size),
        ("max_header_bytes", exchange.max_header_bytes),
        ("max_concurrent", exchange.max_concurrent),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroLimit { field });
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::BadMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
