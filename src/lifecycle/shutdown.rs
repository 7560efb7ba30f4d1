//! Shutdown coordination for the bridge.

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// The dispatcher and the inbound reader subscribe; a signal handler triggers.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal. Returns false if nobody was listening.
    pub fn trigger(&self) -> bool {
        self.tx.send(()).is_ok()
    }

    /// Get the number of tasks still subscribed.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
