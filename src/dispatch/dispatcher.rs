//! Inbound message dispatch.
//!
//! # Responsibilities
//! - Resolve each message's backend port through the route table
//! - Spawn one independent exchange task per message
//! - Cap concurrently running exchanges via semaphore
//! - Publish the completion marker once per exchange, whatever the outcome
//! - Stop on shutdown and drain in-flight exchanges

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::bus::{InboundMessage, MessageBus};
use crate::config::BridgeConfig;
use crate::dispatch::tracker::{ExchangeGuard, ExchangeTracker};
use crate::exchange::{self, ExchangeReport, ExchangeSettings};
use crate::observability::metrics;
use crate::publish::ResponsePublisher;
use crate::routing::RouteTable;

/// Fans inbound messages out to exchange workers.
pub struct Dispatcher<B: ?Sized> {
    routes: Arc<RouteTable>,
    bus: Arc<B>,
    settings: Arc<ExchangeSettings>,
    /// Semaphore to limit concurrently running exchanges.
    worker_slots: Arc<Semaphore>,
    max_concurrent: usize,
    tracker: ExchangeTracker,
}

impl<B> Dispatcher<B>
where
    B: MessageBus + ?Sized,
{
    pub fn new(
        routes: Arc<RouteTable>,
        bus: Arc<B>,
        settings: ExchangeSettings,
        max_concurrent: usize,
    ) -> Self {
        Self {
            routes,
            bus,
            settings: Arc::new(settings),
            worker_slots: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            tracker: ExchangeTracker::new(),
        }
    }

    pub fn from_config(config: &BridgeConfig, bus: Arc<B>) -> Self {
        Self::new(
            Arc::new(RouteTable::from_config(config)),
            bus,
            ExchangeSettings::from_config(config),
            config.exchange.max_concurrent,
        )
    }

    pub fn tracker(&self) -> &ExchangeTracker {
        &self.tracker
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Get current free worker slots.
    pub fn available_slots(&self) -> usize {
        self.worker_slots.available_permits()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Start an exchange for `message` without waiting for it.
    ///
    /// Returns `None` when the message cannot be answered (no reply topic).
    pub fn dispatch(&self, message: InboundMessage) -> Option<JoinHandle<ExchangeReport>> {
        if message.reply_topic.is_empty() {
            tracing::warn!(topic = %message.topic, "Dropping message without reply topic");
            metrics::record_dropped("no_reply_topic");
            return None;
        }

        let port = self.routes.resolve(&message.topic);
        let guard = self.tracker.track();
        let span = tracing::info_span!(
            "exchange",
            exchange_id = %guard.id(),
            topic = %message.topic,
            port,
            reply_topic = %message.reply_topic,
        );

        tracing::debug!(
            parent: &span,
            request = %message.request_line(),
            available_slots = self.worker_slots.available_permits(),
            "Dispatching message"
        );

        let job = Job {
            port,
            message,
            bus: Arc::clone(&self.bus),
            settings: Arc::clone(&self.settings),
            worker_slots: Arc::clone(&self.worker_slots),
            _guard: guard,
        };
        Some(tokio::spawn(job.run().instrument(span)))
    }

    /// Dispatch messages until the inbound stream ends or shutdown is signalled,
    /// then wait up to `drain_timeout` for in-flight exchanges.
    ///
    /// Returns the number of messages dispatched.
    pub async fn run(
        self,
        mut inbound: mpsc::Receiver<InboundMessage>,
        mut shutdown: broadcast::Receiver<()>,
        drain_timeout: Duration,
    ) -> u64 {
        tracing::info!(
            routes = self.routes.len(),
            default_port = self.routes.default_port(),
            max_concurrent = self.max_concurrent,
            "Dispatcher starting"
        );

        let mut dispatched = 0;
        loop {
            tokio::select! {
                message = inbound.recv() => match message {
                    Some(message) => {
                        if self.dispatch(message).is_some() {
                            dispatched += 1;
                        }
                    }
                    None => {
                        tracing::info!("Inbound stream closed");
                        break;
                    }
                },
                _ = shutdown.recv() => {
                    tracing::info!("Dispatcher received shutdown signal");
                    break;
                }
            }
        }

        let in_flight = self.tracker.active_count();
        if in_flight > 0 {
            tracing::info!(in_flight, timeout = ?drain_timeout, "Draining exchanges");
        }
        if !self.tracker.wait_idle(drain_timeout).await {
            tracing::warn!(
                in_flight = self.tracker.active_count(),
                "Drain timeout reached; abandoning exchanges"
            );
        }

        tracing::info!(dispatched, "Dispatcher stopped");
        dispatched
    }
}

/// Everything one exchange task owns.
struct Job<B: ?Sized> {
    port: u16,
    message: InboundMessage,
    bus: Arc<B>,
    settings: Arc<ExchangeSettings>,
    worker_slots: Arc<Semaphore>,
    _guard: ExchangeGuard,
}

impl<B> Job<B>
where
    B: MessageBus + ?Sized,
{
    async fn run(self) -> ExchangeReport {
        // The semaphore is never closed, so a permit always arrives.
        let _permit = self.worker_slots.acquire_owned().await.ok();

        let InboundMessage {
            payload,
            reply_topic,
            correlation_data,
            ..
        } = self.message;

        let mut publisher = ResponsePublisher::new(self.bus, reply_topic, correlation_data);
        let report = exchange::run(self.port, payload, &self.settings, &mut publisher).await;

        if let Err(e) = publisher.finish().await {
            tracing::warn!(error = %e, "Failed to publish completion marker");
        }

        tracing::info!(
            outcome = report.outcome.label(),
            chunks = report.chunks,
            bytes_sent = report.bytes_sent,
            bytes_received = report.bytes_received,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Exchange finished"
        );
        report
    }
}
