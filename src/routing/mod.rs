//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound message topic
//!     → table.rs (exact key lookup)
//!     → Return: backend port (default port when unmapped)
//!
//! Route Compilation (at startup):
//!     [routes] config table
//!     → RouteTable
//!     → Shared via Arc with every exchange
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same topic always resolves to same port

pub mod table;

pub use table::RouteTable;
