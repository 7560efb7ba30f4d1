//! Timeout enforcement.
//!
//! # Responsibilities
//! - Track one exchange's wall-clock budget from its start instant
//! - Bound each readiness wait by the poll interval and the time left
//!
//! # Design Decisions
//! - Uses Tokio's clock so tests with a paused runtime stay deterministic
//! - Timeout errors are distinct from other errors (`Outcome::DeadlineExceeded`)

use std::time::Duration;

use tokio::time::Instant;

/// Wall-clock budget for a single exchange.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    /// Start the clock now.
    pub fn start(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.elapsed())
    }

    pub fn expired(&self) -> bool {
        self.elapsed() >= self.limit
    }

    /// How long the next readiness wait may block.
    pub fn next_wait(&self, poll_interval: Duration) -> Duration {
        poll_interval.min(self.remaining())
    }
}
