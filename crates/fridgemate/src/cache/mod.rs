//! Cache backend implementations.
//!
//! This module provides concrete implementations of the
//! `fridgemate_core::cache::Cache` trait.
//!
//! - [`MemoryCache`]: in-process LRU cache with lazy TTL expiry (always available)
//! - `RedisCache`: Redis cache behind the `redis` feature

pub mod memory;

#[cfg(feature = "redis")]
pub mod redis_impl;

pub use memory::MemoryCache;

#[cfg(feature = "redis")]
pub use redis_impl::RedisCache;
