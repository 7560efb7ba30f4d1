//! Exchange lifecycle tracking.
//!
//! # Responsibilities
//! - Generate unique exchange IDs for tracing
//! - Count in-flight exchanges (queued for a worker slot or running)
//! - Let shutdown wait for in-flight exchanges to drain

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::observability::metrics;

static NEXT_EXCHANGE: AtomicU64 = AtomicU64::new(1);

/// Process-wide exchange number, shown as `exch-<n>` on the exchange span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExchangeId(u64);

impl ExchangeId {
    fn next() -> Self {
        Self(NEXT_EXCHANGE.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exch-{}", self.0)
    }
}

/// Counts in-flight exchanges for graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct ExchangeTracker {
    active_count: Arc<AtomicU64>,
}

impl ExchangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new in-flight exchange. Returns a guard that decrements on drop.
    pub fn track(&self) -> ExchangeGuard {
        let active = self.active_count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_active_exchanges(active);
        ExchangeGuard {
            active_count: Arc::clone(&self.active_count),
            id: ExchangeId::next(),
        }
    }

    /// Get current in-flight exchange count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until no exchange is in flight. Returns false if `limit` elapsed first.
    pub async fn wait_idle(&self, limit: Duration) -> bool {
        let drained = async {
            while self.active_count.load(Ordering::SeqCst) > 0 {
                tokio::time::sleep(Duration::from_millis(25)).await;
            }
        };
        tokio::time::timeout(limit, drained).await.is_ok()
    }
}

/// Held by an exchange task for its whole life, queue time included.
/// Dropping it (also on panic) releases the in-flight slot.
#[derive(Debug)]
pub struct ExchangeGuard {
    active_count: Arc<AtomicU64>,
    id: ExchangeId,
}

impl ExchangeGuard {
    pub fn id(&self) -> ExchangeId {
        self.id
    }
}

impl Drop for ExchangeGuard {
    fn drop(&mut self) {
        let active = self.active_count.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_active_exchanges(active);
        tracing::trace!(exchange_id = %self.id, "Exchange finished");
    }
}
