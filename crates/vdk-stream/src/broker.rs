//! Transport seam for the streaming boundary.
//!
//! [`StreamBroker`] models the minimum a message transport must offer:
//! publish a wire message to a named topic, subscribe to a topic. The
//! in-process [`ChannelBroker`] backs each topic with a tokio broadcast
//! channel; subscriptions see only messages published after they exist,
//! and every subscription ends once the broker is dropped.

use std::collections::BTreeMap;
use std::pin::Pin;

use anyhow::Result;
use tokio::sync::{broadcast, RwLock};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

/// Wire messages from one topic subscription, in publish order.
pub type MessageStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Per-topic channel capacity used by [`ChannelBroker::default`].
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Pluggable message transport.
#[async_trait::async_trait]
pub trait StreamBroker: Send + Sync {
    fn transport_name(&self) -> &'static str;

    /// Publish one wire message to a topic. Publishing to a topic nobody is
    /// subscribed to succeeds and drops the message.
    async fn publish(&self, topic: &str, message: String) -> Result<()>;

    /// Subscribe to a topic. The stream yields messages published after the
    /// subscription was made and ends when the transport shuts down.
    async fn subscribe(&self, topic: &str) -> Result<MessageStream>;
}

/// In-process broker: one broadcast channel per topic, created lazily on
/// first publish or subscribe. A subscriber that falls more than the channel
/// capacity behind loses the overrun messages, exactly like a lagging
/// consumer on a real broker with a retention window.
pub struct ChannelBroker {
    capacity: usize,
    topics: RwLock<BTreeMap<String, broadcast::Sender<String>>>,
}

impl ChannelBroker {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            topics: RwLock::new(BTreeMap::new()),
        }
    }

    async fn sender(&self, topic: &str) -> broadcast::Sender<String> {
        let mut topics = self.topics.write().await;
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for ChannelBroker {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

#[async_trait::async_trait]
impl StreamBroker for ChannelBroker {
    fn transport_name(&self) -> &'static str {
        "channel"
    }

    async fn publish(&self, topic: &str, message: String) -> Result<()> {
        // send errors only when no subscriber exists; that is a drop, not a
        // failure.
        let _ = self.sender(topic).await.send(message);
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<MessageStream> {
        let rx = self.sender(topic).await.subscribe();
        // Lagged / closed entries end or thin the stream silently.
        Ok(Box::pin(BroadcastStream::new(rx).filter_map(|msg| msg.ok())))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_messages_in_publish_order() {
        let broker = ChannelBroker::new(8);
        let sub = broker.subscribe("topic-a").await.unwrap();

        broker.publish("topic-a", "first".to_string()).await.unwrap();
        broker.publish("topic-a", "second".to_string()).await.unwrap();
        drop(broker);

        let got: Vec<String> = sub.collect().await;
        assert_eq!(got, vec!["first".to_string(), "second".to_string()]);
    }

    #[tokio::test]
    async fn messages_before_subscription_are_not_replayed() {
        let broker = ChannelBroker::new(8);
        broker.publish("topic-a", "early".to_string()).await.unwrap();

        let sub = broker.subscribe("topic-a").await.unwrap();
        broker.publish("topic-a", "late".to_string()).await.unwrap();
        drop(broker);

        let got: Vec<String> = sub.collect().await;
        assert_eq!(got, vec!["late".to_string()]);
    }

    #[tokio::test]
    async fn topics_are_independent() {
        let broker = ChannelBroker::new(8);
        let sub = broker.subscribe("topic-a").await.unwrap();

        broker.publish("topic-b", "elsewhere".to_string()).await.unwrap();
        drop(broker);

        let got: Vec<String> = sub.collect().await;
        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_ok() {
        let broker = ChannelBroker::new(8);
        broker.publish("topic-a", "dropped".to_string()).await.unwrap();
    }

    #[tokio::test]
    async fn broadcast_reaches_every_subscriber() {
        let broker = ChannelBroker::new(8);
        let first = broker.subscribe("topic-a").await.unwrap();
        let second = broker.subscribe("topic-a").await.unwrap();

        broker.publish("topic-a", "shared".to_string()).await.unwrap();
        drop(broker);

        let got_first: Vec<String> = first.collect().await;
        let got_second: Vec<String> = second.collect().await;
        assert_eq!(got_first, vec!["shared".to_string()]);
        assert_eq!(got_second, vec!["shared".to_string()]);
    }
}
