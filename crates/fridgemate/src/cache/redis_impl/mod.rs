//! Redis cache backend implementation.
//!
//! Provides a distributed cache using Redis for multi-instance deployments.

mod cache;
mod error;

pub use cache::RedisCache;
pub(crate) use error::map_redis_error;
