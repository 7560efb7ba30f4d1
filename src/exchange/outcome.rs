//! How an exchange ended.

use std::time::Duration;

use thiserror::Error;

use crate::bus::BusError;

/// Failures that end an exchange early.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),

    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("socket error: {0}")]
    Socket(#[source] std::io::Error),

    #[error("publish failed: {0}")]
    Publish(#[source] BusError),
}

/// Terminal state of one exchange.
#[derive(Debug)]
pub enum Outcome {
    /// The framer found the end of the response; `len` is the message length.
    Complete { len: usize },
    /// The backend closed the connection first.
    PeerClosed,
    /// The exchange ran out of time.
    DeadlineExceeded,
    Failed(ExchangeError),
}

impl Outcome {
    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Complete { .. } => "complete",
            Outcome::PeerClosed => "peer_closed",
            Outcome::DeadlineExceeded => "deadline_exceeded",
            Outcome::Failed(ExchangeError::Connect(_)) => "connect_failed",
            Outcome::Failed(ExchangeError::ConnectTimeout(_)) => "connect_timeout",
            Outcome::Failed(ExchangeError::Socket(_)) => "socket_error",
            Outcome::Failed(ExchangeError::Publish(_)) => "publish_failed",
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Outcome::Complete { .. })
    }
}

/// Summary returned by every exchange worker.
#[derive(Debug)]
pub struct ExchangeReport {
    pub port: u16,
    pub outcome: Outcome,
    /// Chunks handed to the sink.
    pub chunks: u64,
    pub bytes_sent: usize,
    pub bytes_received: usize,
    pub elapsed: Duration,
}
