//! Audit event emitters.
//!
//! - [`LogEmitter`]: writes each message to the tracing log
//! - [`BroadcastEmitter`]: in-process fan-out over tokio broadcast channels
//! - [`RedisEmitter`]: Redis `PUBLISH` (requires the `redis` feature)

mod broadcast;
mod log;
#[cfg(feature = "redis")]
mod redis_impl;

pub use broadcast::BroadcastEmitter;
pub use log::LogEmitter;
#[cfg(feature = "redis")]
pub use redis_impl::RedisEmitter;
