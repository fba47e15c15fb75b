//! Redis-backed audit emitter.

use redis::AsyncCommands;
use tokio::runtime::Handle;

use fridgemate_core::cache::Result;
use fridgemate_core::events::EventEmitter;

use crate::cache::redis_impl::map_redis_error;

/// Emitter that `PUBLISH`es each message on a Redis channel named after the topic.
///
/// Every publish runs on a detached task so callers never wait on the
/// network. Delivery failures are logged and dropped.
#[derive(Clone)]
pub struct RedisEmitter {
    client: redis::Client,
    runtime: Handle,
}

impl RedisEmitter {
    /// Connects to Redis at `url`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::ConnectionFailed` if the connection cannot be established.
    pub async fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;

        // Verify connection by getting a connection
        let _ = client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_redis_error)?;

        Ok(Self {
            client,
            runtime: Handle::current(),
        })
    }
}

impl EventEmitter for RedisEmitter {
    fn publish(&self, topic: &str, message: &str) {
        let client = self.client.clone();
        let channel = topic.to_string();
        let payload = message.to_string();

        self.runtime.spawn(async move {
            if let Err(e) = send(&client, &channel, &payload).await {
                tracing::warn!(topic = %channel, error = %e, "Failed to publish audit event");
            }
        });
    }
}

async fn send(client: &redis::Client, channel: &str, payload: &str) -> redis::RedisResult<()> {
    let mut conn = client.get_multiplexed_async_connection().await?;
    conn.publish::<_, _, ()>(channel, payload).await
}
