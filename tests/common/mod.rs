//! Shared utilities for integration and load testing.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use topic_proxy::exchange::ExchangeSettings;
use topic_proxy::publish::{COMPLETION_PAYLOAD, INDEX_PROPERTY, TOTAL_PROPERTY};
use topic_proxy::{Dispatcher, LocalBus, Publication, RouteTable};

/// One scripted write: wait `delay`, then send `bytes`.
#[derive(Clone)]
pub struct Step {
    pub delay: Duration,
    pub bytes: Vec<u8>,
}

pub fn step(delay_ms: u64, bytes: &[u8]) -> Step {
    Step {
        delay: Duration::from_millis(delay_ms),
        bytes: bytes.to_vec(),
    }
}

/// Start a backend that replays `script` on every connection, then keeps the
/// socket open for `hold` before closing it. Returns the port.
pub async fn start_scripted_backend(script: Vec<Step>, hold: Duration) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let script = Arc::new(script);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let script = Arc::clone(&script);
                    tokio::spawn(async move {
                        let mut request = [0u8; 1024];
                        let _ = socket.read(&mut request).await;
                        for step in script.iter() {
                            tokio::time::sleep(step.delay).await;
                            if socket.write_all(&step.bytes).await.is_err() {
                                return;
                            }
                        }
                        tokio::time::sleep(hold).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    port
}

/// Start a simple mock backend that returns a fixed `Content-Length` response
/// and leaves the connection open.
pub async fn start_mock_backend(body: &str) -> u16 {
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    start_scripted_backend(vec![step(0, response.as_bytes())], Duration::from_secs(10)).await
}

/// Start a backend that accepts and reads but never answers.
pub async fn start_silent_backend() -> u16 {
    start_scripted_backend(Vec::new(), Duration::from_secs(60)).await
}

/// Start a backend that counts how many requests it is serving at once.
/// Each request is held for `service_time` before the response is written.
pub async fn start_counting_backend(body: &'static str, service_time: Duration) -> (u16, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let peak_out = Arc::clone(&peak);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let active = Arc::clone(&active);
                    let peak = Arc::clone(&peak);
                    tokio::spawn(async move {
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);

                        let mut request = [0u8; 1024];
                        let _ = socket.read(&mut request).await;
                        tokio::time::sleep(service_time).await;

                        active.fetch_sub(1, Ordering::SeqCst);
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    (port, peak_out)
}

/// A loopback port nobody listens on.
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

pub fn settings(deadline_ms: u64, poll_ms: u64) -> ExchangeSettings {
    ExchangeSettings {
        backend_host: "127.0.0.1".into(),
        connect_timeout: Duration::from_secs(2),
        deadline: Duration::from_millis(deadline_ms),
        poll_interval: Duration::from_millis(poll_ms),
        ..ExchangeSettings::default()
    }
}

pub fn dispatcher(
    routes: &[(&str, u16)],
    default_port: u16,
    settings: ExchangeSettings,
    max_concurrent: usize,
) -> (Dispatcher<LocalBus>, mpsc::UnboundedReceiver<Publication>) {
    let (bus, rx) = LocalBus::new();
    let table = RouteTable::new(routes.iter().map(|(t, p)| (*t, *p)), default_port);
    let dispatcher = Dispatcher::new(Arc::new(table), Arc::new(bus), settings, max_concurrent);
    (dispatcher, rx)
}

pub fn is_marker(publication: &Publication) -> bool {
    &publication.payload[..] == COMPLETION_PAYLOAD && publication.property(TOTAL_PROPERTY).is_some()
}

/// Everything published on one reply topic.
#[derive(Debug, Default)]
pub struct Reply {
    pub chunks: Vec<Publication>,
    pub markers: Vec<Publication>,
}

impl Reply {
    pub fn body(&self) -> Vec<u8> {
        self.chunks.iter().flat_map(|c| c.payload.to_vec()).collect()
    }

    pub fn indices(&self) -> Vec<u64> {
        self.chunks
            .iter()
            .map(|c| c.property(INDEX_PROPERTY).unwrap().parse().unwrap())
            .collect()
    }

    pub fn total(&self) -> u64 {
        self.markers[0].property(TOTAL_PROPERTY).unwrap().parse().unwrap()
    }
}

/// Receive until `markers` completion markers have arrived, grouping by topic.
/// Panics if a chunk arrives on a topic after its marker.
pub async fn collect(
    rx: &mut mpsc::UnboundedReceiver<Publication>,
    markers: usize,
) -> HashMap<String, Reply> {
    let mut replies: HashMap<String, Reply> = HashMap::new();
    let mut seen = 0;
    while seen < markers {
        let publication = tokio::time::timeout(Duration::from_secs(20), rx.recv())
            .await
            .expect("timed out waiting for publications")
            .expect("bus closed");
        let reply = replies.entry(publication.topic.clone()).or_default();
        if is_marker(&publication) {
            seen += 1;
            reply.markers.push(publication);
        } else {
            assert!(
                reply.markers.is_empty(),
                "chunk published after completion marker on {}",
                publication.topic
            );
            reply.chunks.push(publication);
        }
    }
    replies
}
