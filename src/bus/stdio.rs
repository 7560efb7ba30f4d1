//! Newline-delimited JSON bus adapter.
//!
//! Lets an external broker client drive the bridge over a pipe:
//!
//! ```text
//! stdin:  {"topic":"dummy","payload":"GET / HTTP/1.1\r\n\r\n","reply_topic":"r/1"}
//! stdout: {"topic":"r/1","payload":"HTTP/1.1 200 OK...","user_properties":[["indx","0"]]}
//! stdout: {"topic":"r/1","payload":"no-data","user_properties":[["of","1"]]}
//! ```
//!
//! Payloads are written as a string when they are valid UTF-8 and as an array
//! of byte values otherwise; both forms are accepted on input.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};

use crate::bus::{BusError, InboundMessage, MessageBus, Publication};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum WirePayload {
    Text(String),
    Binary(Vec<u8>),
}

impl From<&Bytes> for WirePayload {
    fn from(bytes: &Bytes) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => WirePayload::Text(text.to_string()),
            Err(_) => WirePayload::Binary(bytes.to_vec()),
        }
    }
}

impl From<WirePayload> for Bytes {
    fn from(payload: WirePayload) -> Self {
        match payload {
            WirePayload::Text(text) => Bytes::from(text),
            WirePayload::Binary(raw) => Bytes::from(raw),
        }
    }
}

#[derive(Debug, Deserialize)]
struct InboundLine {
    topic: String,
    payload: WirePayload,
    #[serde(default)]
    reply_topic: String,
    #[serde(default)]
    correlation_data: Option<WirePayload>,
}

#[derive(Debug, Serialize)]
struct OutboundLine<'a> {
    topic: &'a str,
    payload: WirePayload,
    user_properties: &'a [(String, String)],
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_data: Option<WirePayload>,
}

/// Decode one inbound JSON line.
pub fn decode_inbound(line: impl AsRef<[u8]>) -> Result<InboundMessage, serde_json::Error> {
    let wire: InboundLine = serde_json::from_slice(line.as_ref())?;
    Ok(InboundMessage {
        topic: wire.topic,
        payload: wire.payload.into(),
        reply_topic: wire.reply_topic,
        correlation_data: wire.correlation_data.map(Bytes::from),
    })
}

/// Encode one publication as a JSON line (newline included).
pub fn encode_publication(publication: &Publication) -> Result<Vec<u8>, serde_json::Error> {
    let line = OutboundLine {
        topic: &publication.topic,
        payload: WirePayload::from(&publication.payload),
        user_properties: &publication.user_properties,
        correlation_data: publication.correlation_data.as_ref().map(WirePayload::from),
    };
    let mut encoded = serde_json::to_vec(&line)?;
    encoded.push(b'\n');
    Ok(encoded)
}

/// Forward every decodable line of `reader` to `tx` until EOF or the receiver closes.
///
/// Lines that are not valid JSON (including invalid UTF-8) are skipped; only
/// read errors end intake. Returns the number of messages forwarded.
pub async fn read_inbound<R>(mut reader: R, tx: mpsc::Sender<InboundMessage>) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let mut forwarded = 0;
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match decode_inbound(&line) {
            Ok(message) => {
                if tx.send(message).await.is_err() {
                    break;
                }
                forwarded += 1;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed inbound line");
            }
        }
    }
    tracing::debug!(forwarded, "Inbound stream ended");
    Ok(forwarded)
}

/// Bus that writes publications as JSON lines.
pub struct StdioBus<W = tokio::io::Stdout> {
    out: Mutex<W>,
}

impl StdioBus<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> StdioBus<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[async_trait]
impl<W> MessageBus for StdioBus<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn publish(&self, publication: Publication) -> Result<(), BusError> {
        let encoded = encode_publication(&publication)?;
        // One lock per line keeps concurrent exchanges from interleaving bytes.
        let mut out = self.out.lock().await;
        out.write_all(&encoded).await?;
        out.flush().await?;
        Ok(())
    }
}
