//! In-process bus.
//!
//! Publications land on an unbounded channel; the receiving half plays the
//! part of every subscriber. Used when embedding the bridge and in tests.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::bus::{BusError, MessageBus, Publication};

#[derive(Debug, Clone)]
pub struct LocalBus {
    tx: mpsc::UnboundedSender<Publication>,
}

impl LocalBus {
    /// Create a bus and the receiver that observes everything published on it.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Publication>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl MessageBus for LocalBus {
    async fn publish(&self, publication: Publication) -> Result<(), BusError> {
        self.tx.send(publication).map_err(|_| BusError::Closed)
    }
}
