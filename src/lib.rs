//! Topic-to-TCP bridge library.
//!
//! Consumes request messages from a pub/sub bus, forwards each one to a
//! backend TCP service chosen by topic, and republishes the response in
//! sequenced pieces followed by a completion marker.

pub mod bus;
pub mod config;
pub mod dispatch;
pub mod exchange;
pub mod framing;
pub mod lifecycle;
pub mod observability;
pub mod publish;
pub mod resilience;
pub mod routing;

pub use bus::{InboundMessage, LocalBus, MessageBus, Publication, StdioBus};
pub use config::BridgeConfig;
pub use dispatch::Dispatcher;
pub use exchange::{ExchangeReport, ExchangeSettings, Outcome};
pub use lifecycle::Shutdown;
pub use routing::RouteTable;
