//! Single-exchange I/O loop.
//!
//! # Responsibilities
//! - Connect to the backend with a bounded timeout
//! - Multiplex write/read/error readiness on one socket
//! - Handle partial writes by shrinking the pending request
//! - Stream every read to the sink and stop once framing completes
//! - Close the socket on every exit path

use std::io;

use bytes::Bytes;
use tokio::io::Interest;
use tokio::net::TcpStream;
use tokio::time;

use crate::exchange::{ExchangeError, ExchangeReport, ExchangeSettings, Outcome, ResponseSink};
use crate::framing::{FramingReconstructor, Progress};
use crate::observability::metrics;
use crate::resilience::Deadline;

/// Drive one request/response exchange with the backend on `port`.
///
/// Never fails: every way an exchange can end is reported in
/// [`ExchangeReport::outcome`]. The caller owns the completion marker.
pub async fn run<S>(
    port: u16,
    request: Bytes,
    settings: &ExchangeSettings,
    sink: &mut S,
) -> ExchangeReport
where
    S: ResponseSink + ?Sized,
{
    let deadline = Deadline::start(settings.deadline);
    let mut counters = IoCounters::default();

    let outcome = match connect(port, settings, &deadline).await {
        Ok(stream) => {
            let outcome = drive(&stream, request, settings, &deadline, sink, &mut counters).await;
            drop(stream);
            tracing::trace!(port, "Backend socket closed");
            outcome
        }
        Err(e) => Outcome::Failed(e),
    };

    let elapsed = deadline.elapsed();
    metrics::record_exchange(outcome.label(), elapsed);

    ExchangeReport {
        port,
        outcome,
        chunks: counters.chunks,
        bytes_sent: counters.sent,
        bytes_received: counters.received,
        elapsed,
    }
}

#[derive(Debug, Default)]
struct IoCounters {
    chunks: u64,
    sent: usize,
    received: usize,
}

async fn connect(
    port: u16,
    settings: &ExchangeSettings,
    deadline: &Deadline,
) -> Result<TcpStream, ExchangeError> {
    let limit = settings.connect_timeout.min(deadline.remaining());
    let host = settings.backend_host.as_str();

    match time::timeout(limit, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => {
            tracing::debug!(host, port, "Connected to backend");
            Ok(stream)
        }
        Ok(Err(e)) => {
            tracing::warn!(host, port, error = %e, "Backend connect failed");
            Err(ExchangeError::Connect(e))
        }
        Err(_) => {
            tracing::warn!(host, port, timeout = ?limit, "Backend connect timed out");
            Err(ExchangeError::ConnectTimeout(limit))
        }
    }
}

async fn drive<S>(
    stream: &TcpStream,
    request: Bytes,
    settings: &ExchangeSettings,
    deadline: &Deadline,
    sink: &mut S,
    counters: &mut IoCounters,
) -> Outcome
where
    S: ResponseSink + ?Sized,
{
    let mut pending = request;
    let mut buf = vec![0u8; settings.read_chunk_size];
    let mut framer = FramingReconstructor::new(settings.max_header_bytes);

    loop {
        if deadline.expired() {
            tracing::warn!(
                elapsed = ?deadline.elapsed(),
                received = counters.received,
                "Exchange deadline exceeded"
            );
            return Outcome::DeadlineExceeded;
        }

        let mut interest = Interest::READABLE.add(Interest::ERROR);
        if !pending.is_empty() {
            interest = interest.add(Interest::WRITABLE);
        }

        let wait = deadline.next_wait(settings.poll_interval);
        let ready = match time::timeout(wait, stream.ready(interest)).await {
            // Poll interval elapsed with nothing ready; re-arm.
            Err(_) => continue,
            Ok(Ok(ready)) => ready,
            Ok(Err(e)) => return Outcome::Failed(ExchangeError::Socket(e)),
        };

        if ready.is_error() {
            let err = stream
                .take_error()
                .ok()
                .flatten()
                .unwrap_or_else(|| io::Error::other("socket reported an error condition"));
            tracing::debug!(error = %err, "Exceptional condition on backend socket");
            return Outcome::Failed(ExchangeError::Socket(err));
        }

        if ready.is_writable() && !pending.is_empty() {
            match stream.try_write(&pending) {
                Ok(n) => {
                    counters.sent += n;
                    pending = pending.slice(n..);
                    tracing::trace!(written = n, remaining = pending.len(), "Request bytes written");
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => return Outcome::Failed(ExchangeError::Socket(e)),
            }
        }

        if ready.is_readable() {
            match stream.try_read(&mut buf) {
                Ok(0) => {
                    tracing::debug!(received = counters.received, "Backend closed the connection");
                    return Outcome::PeerClosed;
                }
                Ok(n) => {
                    counters.received += n;
                    let progress = framer.feed(&buf[..n]);
                    tracing::trace!(len = n, ?progress, "Response bytes read");

                    if let Err(e) = sink.emit(Bytes::copy_from_slice(&buf[..n])).await {
                        tracing::warn!(error = %e, "Dropping exchange after publish failure");
                        return Outcome::Failed(ExchangeError::Publish(e));
                    }
                    counters.chunks += 1;

                    if let Progress::Complete { at } = progress {
                        return Outcome::Complete { len: at };
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => return Outcome::Failed(ExchangeError::Socket(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn settings() -> ExchangeSettings {
        ExchangeSettings {
            backend_host: "127.0.0.1".into(),
            connect_timeout: Duration::from_secs(2),
            deadline: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
            read_chunk_size: 16 * 1024,
            max_header_bytes: 16 * 1024,
        }
    }

    #[tokio::test]
    async fn content_length_response_completes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 64];
            let n = socket.read(&mut request).await.unwrap();
            assert!(request[..n].starts_with(b"GET /status"));
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nOK")
                .await
                .unwrap();
            // Hold the socket open; the framer must end the exchange.
            tokio::time::sleep(Duration::from_secs(3)).await;
        });

        let mut chunks: Vec<Bytes> = Vec::new();
        let report = run(
            port,
            Bytes::from_static(b"GET /status HTTP/1.1\r\n\r\n"),
            &settings(),
            &mut chunks,
        )
        .await;

        assert!(matches!(report.outcome, Outcome::Complete { .. }), "{:?}", report.outcome);
        assert_eq!(report.bytes_sent, 24);
        assert_eq!(report.chunks, chunks.len() as u64);
        let body: Vec<u8> = chunks.concat();
        assert!(body.ends_with(b"\r\n\r\nOK"));
        assert!(report.elapsed < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn large_request_is_written_across_partial_writes() {
        const REQUEST_LEN: usize = 8 * 1024 * 1024;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let backend = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            // Let the socket buffers fill before draining.
            tokio::time::sleep(Duration::from_millis(200)).await;
            let mut request = vec![0u8; REQUEST_LEN];
            socket.read_exact(&mut request).await.unwrap();
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nOK")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(3)).await;
            request
        });

        let mut request = b"POST /upload HTTP/1.1\r\n\r\n".to_vec();
        request.resize(REQUEST_LEN, b'x');
        let request = Bytes::from(request);

        let mut chunks: Vec<Bytes> = Vec::new();
        let report = run(port, request.clone(), &settings(), &mut chunks).await;

        assert!(matches!(report.outcome, Outcome::Complete { .. }), "{:?}", report.outcome);
        assert_eq!(report.bytes_sent, REQUEST_LEN);
        assert!(chunks.concat().ends_with(b"\r\n\r\nOK"));

        let received = backend.await.unwrap();
        assert_eq!(&received[..], &request[..]);
    }

    #[tokio::test]
    async fn refused_connection_emits_nothing() {
        // Bind then drop to find a port nobody listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let mut chunks: Vec<Bytes> = Vec::new();
        let report = run(port, Bytes::from_static(b"GET / HTTP/1.1\r\n\r\n"), &settings(), &mut chunks).await;

        assert!(matches!(
            report.outcome,
            Outcome::Failed(ExchangeError::Connect(_))
        ));
        assert!(chunks.is_empty());
        assert_eq!(report.chunks, 0);
    }

    #[tokio::test]
    async fn peer_close_ends_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 64];
            let _ = socket.read(&mut request).await;
            // Header never terminated, then close.
            socket.write_all(b"HTTP/1.1 200 OK\r\n").await.unwrap();
        });

        let mut chunks: Vec<Bytes> = Vec::new();
        let report = run(port, Bytes::from_static(b"GET / HTTP/1.1\r\n\r\n"), &settings(), &mut chunks).await;

        assert!(matches!(report.outcome, Outcome::PeerClosed), "{:?}", report.outcome);
        assert_eq!(chunks.concat(), b"HTTP/1.1 200 OK\r\n".to_vec());
    }
}
