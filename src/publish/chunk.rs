//! Reply units published to the bus.

use bytes::Bytes;

use crate::bus::Publication;

/// Payload of the end-of-stream marker.
pub const COMPLETION_PAYLOAD: &[u8] = b"no-data";
/// User property carrying a chunk's sequence index.
pub const INDEX_PROPERTY: &str = "indx";
/// User property carrying the total chunk count on the completion marker.
pub const TOTAL_PROPERTY: &str = "of";

/// Bytes read from the backend during one read interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundChunk {
    pub reply_topic: String,
    pub payload: Bytes,
    pub sequence_index: u64,
}

impl OutboundChunk {
    pub fn into_publication(self, correlation_data: Option<Bytes>) -> Publication {
        Publication {
            topic: self.reply_topic,
            payload: self.payload,
            user_properties: vec![(INDEX_PROPERTY.to_string(), self.sequence_index.to_string())],
            correlation_data,
        }
    }
}

/// Terminal marker: the stream for `reply_topic` has ended after `total_chunks` chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionMarker {
    pub reply_topic: String,
    pub total_chunks: u64,
}

impl CompletionMarker {
    pub fn into_publication(self, correlation_data: Option<Bytes>) -> Publication {
        Publication {
            topic: self.reply_topic,
            payload: Bytes::from_static(COMPLETION_PAYLOAD),
            user_properties: vec![(TOTAL_PROPERTY.to_string(), self.total_chunks.to_string())],
            correlation_data,
        }
    }
}
