use std::{env, time::Duration};

use fridgemate_core::cache::DEFAULT_TTL;
use fridgemate_core::pool::{PoolConfig, PoolConfigError};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache TTL in seconds (default: 86,400)
    pub cache_ttl_seconds: u64,
    /// Maximum number of in-memory cache entries (default: 10,000)
    pub cache_max_entries: usize,
    /// Workers per entity service (default: 10)
    pub pool_workers: usize,
    /// Queued tasks per worker (default: 10)
    pub pool_max_pending: usize,
    /// How long a caller waits for a task, in milliseconds (default: 30,000)
    pub pool_task_timeout_ms: u64,
    /// Age after which notifications are purged, in hours (default: 24, 0 disables purging)
    pub notification_retention_hours: u64,
    /// Path to SQLite database file (default: "fridgemate.db")
    /// Note: Only used when the `sqlite` feature is enabled.
    #[allow(dead_code)]
    pub sqlite_path: String,
    /// Redis connection URL (default: "redis://localhost:6379")
    /// Note: Only used when the `redis` feature is enabled.
    #[allow(dead_code)]
    pub redis_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CACHE_TTL_SECONDS` - Cache TTL in seconds (default: 86,400)
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 10,000)
    /// - `POOL_WORKERS` - Workers per service pool (default: 10)
    /// - `POOL_MAX_PENDING` - Queued tasks per worker (default: 10)
    /// - `POOL_TASK_TIMEOUT_MS` - Task wait timeout (default: 30,000)
    /// - `NOTIFICATION_RETENTION_HOURS` - Notification retention, 0 disables purging (default: 24)
    /// - `SQLITE_PATH` - SQLite database path (default: "fridgemate.db")
    /// - `REDIS_URL` - Redis connection URL (default: "redis://localhost:6379")
    pub fn from_env() -> Self {
        Self {
            cache_ttl_seconds: parse_var("CACHE_TTL_SECONDS", DEFAULT_TTL.as_secs()),
            cache_max_entries: parse_var("CACHE_MAX_ENTRIES", 10_000),
            pool_workers: parse_var("POOL_WORKERS", 10),
            pool_max_pending: parse_var("POOL_MAX_PENDING", 10),
            pool_task_timeout_ms: parse_var("POOL_TASK_TIMEOUT_MS", 30_000),
            notification_retention_hours: parse_var("NOTIFICATION_RETENTION_HOURS", 24),
            sqlite_path: env::var("SQLITE_PATH").unwrap_or_else(|_| "fridgemate.db".to_string()),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
        }
    }

    /// Get cache TTL as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// Get notification retention as a Duration.
    pub fn notification_retention(&self) -> Duration {
        Duration::from_secs(self.notification_retention_hours.saturating_mul(3600))
    }

    /// Pool settings shared by every entity service.
    pub fn pool_config(&self) -> Result<PoolConfig, PoolConfigError> {
        PoolConfig::new(
            self.pool_workers,
            self.pool_max_pending,
            self.pool_task_timeout_ms,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
