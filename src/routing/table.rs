//! Topic to backend port lookup.
//!
//! # Responsibilities
//! - Store the topic → port mapping
//! - Resolve a topic to exactly one port
//! - Fall back to the default port for unmapped topics
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) exact-key lookup via HashMap
//! - Silent default rather than explicit NoMatch: every message gets a backend

use std::collections::HashMap;

use crate::config::BridgeConfig;

/// Static mapping from topic key to backend TCP port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: HashMap<String, u16>,
    default_port: u16,
}

impl RouteTable {
    /// Build a table from explicit entries.
    ///
    /// A key listed twice keeps its last port, so every key maps to exactly one port.
    pub fn new<I, K>(entries: I, default_port: u16) -> Self
    where
        I: IntoIterator<Item = (K, u16)>,
        K: Into<String>,
    {
        let routes = entries
            .into_iter()
            .map(|(topic, port)| (topic.into(), port))
            .collect();
        Self {
            routes,
            default_port,
        }
    }

    /// Compile the route table from configuration.
    pub fn from_config(config: &BridgeConfig) -> Self {
        let table = Self::new(
            config.routes.iter().map(|(k, v)| (k.clone(), *v)),
            config.backend.default_port,
        );
        tracing::info!(
            routes = table.len(),
            default_port = table.default_port,
            "Route table compiled"
        );
        table
    }

    /// Port for `topic`, or the default port when the topic is unmapped.
    pub fn resolve(&self, topic: &str) -> u16 {
        self.routes
            .get(topic)
            .copied()
            .unwrap_or(self.default_port)
    }

    /// Whether `topic` has an explicit entry.
    pub fn contains(&self, topic: &str) -> bool {
        self.routes.contains_key(topic)
    }

    pub fn default_port(&self) -> u16 {
        self.default_port
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Topics a bus client should subscribe to.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}
