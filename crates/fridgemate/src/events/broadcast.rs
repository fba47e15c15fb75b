//! In-process audit fan-out.
//!
//! Each topic gets its own tokio broadcast channel, created on first use.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;

use fridgemate_core::events::EventEmitter;

/// Channel capacity for each topic.
const CHANNEL_CAPACITY: usize = 100;

/// Emitter that fans messages out to in-process subscribers.
///
/// Publishing to a topic nobody listens to drops the message. Slow
/// subscribers lag and lose the oldest messages rather than blocking
/// publishers.
#[derive(Debug, Clone, Default)]
pub struct BroadcastEmitter {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<String>>>>,
}

impl BroadcastEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to every message published on `topic` from now on.
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<String> {
        self.sender(topic).subscribe()
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<String> {
        // Try read lock first to avoid write contention
        {
            let channels = match self.channels.read() {
                Ok(channels) => channels,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(sender) = channels.get(topic) {
                return sender.clone();
            }
        }

        let mut channels = match self.channels.write() {
            Ok(channels) => channels,
            Err(poisoned) => poisoned.into_inner(),
        };
        channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

impl EventEmitter for BroadcastEmitter {
    fn publish(&self, topic: &str, message: &str) {
        // No receivers is not an error.
        let _ = self.sender(topic).send(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_and_subscribe() {
        let emitter = BroadcastEmitter::new();
        let mut receiver = emitter.subscribe("budget-topic");

        emitter.publish("budget-topic", "budget 1 created");

        assert_eq!(receiver.recv().await.unwrap(), "budget 1 created");
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let emitter = BroadcastEmitter::new();
        let mut first = emitter.subscribe("user-topic");
        let mut second = emitter.subscribe("user-topic");

        emitter.publish("user-topic", "user 1 deleted");

        assert_eq!(first.recv().await.unwrap(), "user 1 deleted");
        assert_eq!(second.recv().await.unwrap(), "user 1 deleted");
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let emitter = BroadcastEmitter::new();
        let mut recipes = emitter.subscribe("recipe-topic");
        let mut products = emitter.subscribe("product-topic");

        emitter.publish("recipe-topic", "recipe 3 created");

        assert_eq!(recipes.recv().await.unwrap(), "recipe 3 created");
        assert!(products.try_recv().is_err());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let emitter = BroadcastEmitter::new();
        emitter.publish("notification-topic", "dropped");

        let channels = emitter.channels.read().unwrap();
        assert_eq!(channels.len(), 1);
    }

    #[test]
    fn test_channel_reuse() {
        let emitter = BroadcastEmitter::new();
        let _first = emitter.subscribe("user-topic");
        let _second = emitter.subscribe("user-topic");

        assert_eq!(emitter.channels.read().unwrap().len(), 1);
    }
}
