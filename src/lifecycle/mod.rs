//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Route table → Bus → Inbound reader → Dispatcher
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop intake → Drain exchanges → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Shutdown has a timeout: exchanges still running after it are abandoned
//! - End of the inbound stream is treated like a shutdown request

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use startup::{run_stdio, StartupError};
