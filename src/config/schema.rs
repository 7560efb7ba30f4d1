//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Backend host and fallback port.
    pub backend: BackendConfig,

    /// Topic key to backend port mapping.
    pub routes: BTreeMap<String, u16>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Per-exchange I/O limits and the worker-pool cap.
    pub exchange: ExchangeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Startup/shutdown settings.
    pub lifecycle: LifecycleConfig,
}

/// Where backends live.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Host every backend port is opened on.
    pub host: String,

    /// Port used for topics with no entry in `routes`.
    pub default_port: u16,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            default_port: 3000,
        }
    }
}

/// Timeout configuration for one exchange.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Overall exchange deadline in milliseconds, measured from exchange start.
    pub deadline_ms: u64,

    /// Upper bound on a single readiness wait in milliseconds.
    pub poll_interval_ms: u64,
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 10_000,
            deadline_ms: 30_000,
            poll_interval_ms: 5_000,
        }
    }
}

/// Per-exchange I/O sizing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Maximum bytes taken from the socket per read (one published chunk at most).
    pub read_chunk_size: usize,

    /// Header bytes buffered while searching for the header terminator.
    pub max_header_bytes: usize,

    /// Maximum exchanges running at once (backpressure).
    pub max_concurrent: usize,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: 62 * 1024,
            max_header_bytes: 64 * 1024,
            max_concurrent: 256,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// How long shutdown waits for in-flight exchanges, in milliseconds.
    pub drain_timeout_ms: u64,
}

impl LifecycleConfig {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            // One full exchange deadline plus slack.
            drain_timeout_ms: 35_000,
        }
    }
}
