//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BridgeConfig (validated, immutable)
//!     → RouteTable / ExchangeSettings built once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the route table never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, read_config, ConfigError};
pub use schema::{
    BackendConfig, BridgeConfig, ExchangeConfig, LifecycleConfig, LogFormat, ObservabilityConfig,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
