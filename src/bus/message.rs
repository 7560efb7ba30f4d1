//! Messages crossing the bus boundary.

use bytes::Bytes;

/// A request delivered by the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Topic the request was published on; selects the backend.
    pub topic: String,
    /// Raw request bytes, forwarded to the backend verbatim.
    pub payload: Bytes,
    /// Where the response pieces are published.
    pub reply_topic: String,
    /// Opaque bytes echoed back on every reply.
    pub correlation_data: Option<Bytes>,
}

impl InboundMessage {
    pub fn new(
        topic: impl Into<String>,
        payload: impl Into<Bytes>,
        reply_topic: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            reply_topic: reply_topic.into(),
            correlation_data: None,
        }
    }

    pub fn with_correlation(mut self, data: impl Into<Bytes>) -> Self {
        self.correlation_data = Some(data.into());
        self
    }

    /// First line of the request, for logs.
    pub fn request_line(&self) -> String {
        let end = self
            .payload
            .iter()
            .position(|&b| b == b'\n')
            .unwrap_or(self.payload.len())
            .min(256);
        String::from_utf8_lossy(&self.payload[..end])
            .trim_end()
            .to_string()
    }
}

/// Something the bridge asks the bus to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub topic: String,
    pub payload: Bytes,
    /// Key/value metadata attached to the publish (`indx`, `of`).
    pub user_properties: Vec<(String, String)>,
    pub correlation_data: Option<Bytes>,
}

impl Publication {
    /// Value of the first user property called `key`.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.user_properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
