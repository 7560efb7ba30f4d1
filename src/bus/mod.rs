//! Message bus boundary.
//!
//! # Data Flow
//! ```text
//! Bus client (external)
//!     → InboundMessage stream (mpsc)
//!     → Dispatcher
//!     ...
//!     ResponsePublisher
//!     → MessageBus::publish(Publication)
//!     → Bus client (external)
//! ```
//!
//! # Design Decisions
//! - The broker client is a collaborator behind the `MessageBus` trait
//! - Inbound delivery is a plain channel so any client can feed it
//! - `LocalBus` (in-process) and `StdioBus` (JSON lines) are the bundled adapters

pub mod local;
pub mod message;
pub mod stdio;

use async_trait::async_trait;
use thiserror::Error;

pub use local::LocalBus;
pub use message::{InboundMessage, Publication};
pub use stdio::StdioBus;

/// Error type for bus operations.
#[derive(Debug, Error)]
pub enum BusError {
    /// The bus connection is gone.
    #[error("bus closed")]
    Closed,
    /// Writing to the underlying transport failed.
    #[error("bus I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The publication could not be encoded for the transport.
    #[error("bus encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Publish side of a pub/sub bus.
#[async_trait]
pub trait MessageBus: Send + Sync + 'static {
    async fn publish(&self, publication: Publication) -> Result<(), BusError>;
}
