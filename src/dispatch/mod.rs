//! Message dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! InboundMessage (mpsc)
//!     → dispatcher.rs (reply topic check, route lookup)
//!     → tracker.rs (exchange id, in-flight count)
//!     → tokio::spawn per message
//!         → wait for a worker slot (semaphore)
//!         → exchange::run → ResponsePublisher
//!         → completion marker
//! ```
//!
//! # Design Decisions
//! - Delivery never blocks on a busy pool: tasks queue on the semaphore
//! - Exchanges share nothing mutable; a failing exchange cannot affect another
//! - Shutdown stops intake first, then drains with a timeout

pub mod dispatcher;
pub mod tracker;

pub use dispatcher::Dispatcher;
pub use tracker::{ExchangeGuard, ExchangeId, ExchangeTracker};
