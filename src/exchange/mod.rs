//! Backend exchange subsystem.
//!
//! # Data Flow
//! ```text
//! (port, request bytes)
//!     → worker.rs connect (bounded)
//!     → readiness loop:
//!         writable → write pending request bytes
//!         readable → read chunk → framing::feed → ResponseSink::emit
//!         error / peer close / deadline → stop
//!     → ExchangeReport
//! ```
//!
//! # Design Decisions
//! - One socket, one loop, one owner: nothing else touches the socket
//! - Chunks are streamed as read, never buffered until the end
//! - Timers and sequence counters are local to the exchange

pub mod outcome;
pub mod worker;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::bus::BusError;
use crate::config::BridgeConfig;

pub use outcome::{ExchangeError, ExchangeReport, Outcome};
pub use worker::run;

/// Receives response chunks as the worker reads them.
#[async_trait]
pub trait ResponseSink: Send {
    async fn emit(&mut self, chunk: Bytes) -> Result<(), BusError>;
}

/// Collects chunks in memory.
#[async_trait]
impl ResponseSink for Vec<Bytes> {
    async fn emit(&mut self, chunk: Bytes) -> Result<(), BusError> {
        self.push(chunk);
        Ok(())
    }
}

/// Knobs for one exchange.
#[derive(Debug, Clone)]
pub struct ExchangeSettings {
    pub backend_host: String,
    pub connect_timeout: Duration,
    pub deadline: Duration,
    pub poll_interval: Duration,
    pub read_chunk_size: usize,
    pub max_header_bytes: usize,
}

impl ExchangeSettings {
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            backend_host: config.backend.host.clone(),
            connect_timeout: config.timeouts.connect(),
            deadline: config.timeouts.deadline(),
            poll_interval: config.timeouts.poll_interval(),
            read_chunk_size: config.exchange.read_chunk_size,
            max_header_bytes: config.exchange.max_header_bytes,
        }
    }
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self::from_config(&BridgeConfig::default())
    }
}
