//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Exchange with backend:
//!     → timeouts.rs (connect timeout, per-wait poll bound, overall deadline)
//!     → On expiry: exchange ends with what it has, completion marker still sent
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every exchange has a deadline
//! - No retries: each inbound message yields exactly one attempt
//! - Failures stay local to one exchange

pub mod timeouts;

pub use timeouts::Deadline;
