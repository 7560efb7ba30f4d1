//! Per-exchange response publisher.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::bus::{BusError, MessageBus};
use crate::exchange::ResponseSink;
use crate::observability::metrics;
use crate::publish::chunk::{CompletionMarker, OutboundChunk};

/// Turns one exchange's response pieces into bus publishes.
pub struct ResponsePublisher<B: ?Sized> {
    bus: Arc<B>,
    reply_topic: String,
    correlation_data: Option<Bytes>,
    next_index: u64,
}

impl<B> ResponsePublisher<B>
where
    B: MessageBus + ?Sized,
{
    pub fn new(bus: Arc<B>, reply_topic: impl Into<String>, correlation_data: Option<Bytes>) -> Self {
        Self {
            bus,
            reply_topic: reply_topic.into(),
            correlation_data,
            next_index: 0,
        }
    }

    pub fn reply_topic(&self) -> &str {
        &self.reply_topic
    }

    /// Chunks successfully published so far.
    pub fn chunks_emitted(&self) -> u64 {
        self.next_index
    }

    /// Publish `payload` as the next chunk.
    pub async fn publish_chunk(&mut self, payload: Bytes) -> Result<(), BusError> {
        let len = payload.len();
        let chunk = OutboundChunk {
            reply_topic: self.reply_topic.clone(),
            payload,
            sequence_index: self.next_index,
        };
        self.bus
            .publish(chunk.into_publication(self.correlation_data.clone()))
            .await?;

        tracing::trace!(
            reply_topic = %self.reply_topic,
            indx = self.next_index,
            len,
            "Chunk published"
        );
        metrics::record_chunk_published(len);
        self.next_index += 1;
        Ok(())
    }

    /// Publish the completion marker. Consumes the publisher.
    pub async fn finish(self) -> Result<CompletionMarker, BusError> {
        let marker = CompletionMarker {
            reply_topic: self.reply_topic,
            total_chunks: self.next_index,
        };
        self.bus
            .publish(marker.clone().into_publication(self.correlation_data))
            .await?;
        tracing::debug!(
            reply_topic = %marker.reply_topic,
            of = marker.total_chunks,
            "Completion marker published"
        );
        Ok(marker)
    }
}

#[async_trait]
impl<B> ResponseSink for ResponsePublisher<B>
where
    B: MessageBus + ?Sized,
{
    async fn emit(&mut self, chunk: Bytes) -> Result<(), BusError> {
        self.publish_chunk(chunk).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::LocalBus;
    use crate::publish::{COMPLETION_PAYLOAD, INDEX_PROPERTY, TOTAL_PROPERTY};

    #[tokio::test]
    async fn indices_are_dense_and_ordered() {
        let (bus, mut rx) = LocalBus::new();
        let mut publisher = ResponsePublisher::new(Arc::new(bus), "reply/1", None);

        for piece in ["a", "b", "c"] {
            publisher.publish_chunk(Bytes::from(piece)).await.unwrap();
        }
        let marker = publisher.finish().await.unwrap();
        assert_eq!(marker.total_chunks, 3);

        for expected in 0..3u64 {
            let publication = rx.recv().await.unwrap();
            assert_eq!(publication.topic, "reply/1");
            assert_eq!(
                publication.property(INDEX_PROPERTY),
                Some(expected.to_string().as_str())
            );
        }
        let end = rx.recv().await.unwrap();
        assert_eq!(&end.payload[..], COMPLETION_PAYLOAD);
        assert_eq!(end.property(TOTAL_PROPERTY), Some("3"));
    }

    #[tokio::test]
    async fn empty_exchange_still_completes() {
        let (bus, mut rx) = LocalBus::new();
        let publisher = ResponsePublisher::new(Arc::new(bus), "reply/2", None);
        publisher.finish().await.unwrap();

        let end = rx.recv().await.unwrap();
        assert_eq!(end.property(TOTAL_PROPERTY), Some("0"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn correlation_is_echoed() {
        let (bus, mut rx) = LocalBus::new();
        let bus: Arc<dyn MessageBus> = Arc::new(bus);
        let mut publisher =
            ResponsePublisher::new(bus, "reply/3", Some(Bytes::from_static(b"id-9")));
        publisher.emit(Bytes::from_static(b"x")).await.unwrap();
        publisher.finish().await.unwrap();

        for _ in 0..2 {
            let publication = rx.recv().await.unwrap();
            assert_eq!(publication.correlation_data.as_deref(), Some(&b"id-9"[..]));
        }
    }

    #[tokio::test]
    async fn failed_publish_is_not_counted() {
        let (bus, rx) = LocalBus::new();
        drop(rx);
        let mut publisher = ResponsePublisher::new(Arc::new(bus), "reply/4", None);
        assert!(publisher.publish_chunk(Bytes::from_static(b"x")).await.is_err());
        assert_eq!(publisher.chunks_emitted(), 0);
    }
}
