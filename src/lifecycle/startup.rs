//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics exporter when enabled
//! - Wire the inbound reader, bus, and dispatcher together
//! - Hand the dispatcher a shutdown subscription and wait for it to drain
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The inbound reader starts last, once the dispatcher can take messages

use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::mpsc;

use crate::bus::{stdio, MessageBus, StdioBus};
use crate::config::BridgeConfig;
use crate::dispatch::Dispatcher;
use crate::lifecycle::{shutdown_signal, Shutdown};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid metrics address '{address}': {source}")]
    MetricsAddress {
        address: String,
        #[source]
        source: AddrParseError,
    },

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Install the Prometheus exporter if the config asks for it.
pub fn start_metrics(config: &BridgeConfig) -> Result<(), StartupError> {
    if !config.observability.metrics_enabled {
        return Ok(());
    }
    let address = &config.observability.metrics_address;
    let addr: SocketAddr = address.parse().map_err(|source| StartupError::MetricsAddress {
        address: address.clone(),
        source,
    })?;
    metrics::init_metrics(addr)?;
    Ok(())
}

/// Run the bridge over an arbitrary inbound reader and bus until the reader
/// hits EOF or `shutdown` fires. Returns the number of messages dispatched.
pub async fn run<R, B>(config: &BridgeConfig, reader: R, bus: Arc<B>, shutdown: &Shutdown) -> u64
where
    R: AsyncBufRead + Unpin + Send + 'static,
    B: MessageBus + ?Sized,
{
    let dispatcher = Dispatcher::from_config(config, bus);
    let (tx, inbound) = mpsc::channel(config.exchange.max_concurrent.max(1));
    let stop = shutdown.subscribe();

    tokio::spawn(async move {
        if let Err(e) = stdio::read_inbound(reader, tx).await {
            tracing::error!(error = %e, "Inbound reader failed");
        }
    });

    dispatcher
        .run(inbound, stop, config.lifecycle.drain_timeout())
        .await
}

/// Run the bridge on stdin/stdout until EOF or SIGINT/SIGTERM.
pub async fn run_stdio(config: &BridgeConfig) -> Result<u64, StartupError> {
    start_metrics(config)?;

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.trigger();
    });

    let bus = Arc::new(StdioBus::stdout());
    let reader = BufReader::new(tokio::io::stdin());
    Ok(run(config, reader, bus, &shutdown).await)
}
