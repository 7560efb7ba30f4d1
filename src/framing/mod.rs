//! Response framing subsystem.
//!
//! # Data Flow
//! ```text
//! Bytes read from backend socket
//!     → state.rs (FramingReconstructor::feed)
//!         → header.rs (terminator search, Content-Length / Transfer-Encoding)
//!         → chunked.rs (incremental chunk walk)
//!     → Progress::Incomplete | Progress::Complete { at }
//! ```
//!
//! # Design Decisions
//! - Pure state machine: no I/O, testable without sockets
//! - Only the header block and the current chunk control line are buffered
//! - Permissive: answers "where does the byte stream end", not "is this valid HTTP"
//! - No length signal means an empty body; connection-close-delimited bodies are
//!   cut at the header

pub mod chunked;
pub mod header;
pub mod state;

pub use state::{BodyMode, FramingReconstructor, FramingState, Progress};
