//! Response publishing subsystem.
//!
//! # Data Flow
//! ```text
//! Exchange worker read
//!     → publisher.rs (assign next sequence index)
//!     → chunk.rs (OutboundChunk → Publication with `indx`)
//!     → MessageBus::publish
//!
//! Exchange end (any outcome):
//!     → publisher.rs finish() (consumes the publisher)
//!     → chunk.rs (CompletionMarker → `no-data` with `of`)
//! ```
//!
//! # Design Decisions
//! - Sequence indices start at 0 and are assigned in read order
//! - `finish` takes `self`, so the marker cannot be sent twice

pub mod chunk;
pub mod publisher;

pub use chunk::{CompletionMarker, OutboundChunk, COMPLETION_PAYLOAD, INDEX_PROPERTY, TOTAL_PROPERTY};
pub use publisher::ResponsePublisher;
