//! Worker pool configuration with validation.

use thiserror::Error;

/// Errors raised when building a [`PoolConfig`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolConfigError {
    #[error("Worker count must be greater than 0")]
    InvalidWorkerCount,
    #[error("Queue capacity must be greater than 0")]
    InvalidQueueCapacity,
    #[error("Task timeout must be greater than 0")]
    InvalidTimeout,
}

/// Configuration for a bounded worker pool (validated).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of workers.
    pub worker_count: usize,
    /// Queued tasks per worker before the worker counts as full.
    pub max_pending: usize,
    /// How long a caller waits for a task result, in milliseconds.
    pub task_timeout_ms: u64,
}

impl PoolConfig {
    /// Create and validate pool config.
    pub fn new(
        worker_count: usize,
        max_pending: usize,
        task_timeout_ms: u64,
    ) -> Result<Self, PoolConfigError> {
        if worker_count == 0 {
            return Err(PoolConfigError::InvalidWorkerCount);
        }
        if max_pending == 0 {
            return Err(PoolConfigError::InvalidQueueCapacity);
        }
        if task_timeout_ms == 0 {
            return Err(PoolConfigError::InvalidTimeout);
        }
        Ok(Self {
            worker_count,
            max_pending,
            task_timeout_ms,
        })
    }

    /// Create with defaults (10 pending per worker, 30s timeout).
    pub fn with_defaults(worker_count: usize) -> Result<Self, PoolConfigError> {
        Self::new(worker_count, 10, 30_000)
    }

    /// Total number of tasks the pool accepts before reporting saturation.
    pub fn capacity(&self) -> usize {
        self.worker_count * self.max_pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_valid() {
        let config = PoolConfig::new(4, 25, 5_000).unwrap();
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.max_pending, 25);
        assert_eq!(config.task_timeout_ms, 5_000);
        assert_eq!(config.capacity(), 100);
    }

    #[test]
    fn test_pool_config_zero_workers() {
        let result = PoolConfig::new(0, 10, 5_000);
        assert!(matches!(result, Err(PoolConfigError::InvalidWorkerCount)));
    }

    #[test]
    fn test_pool_config_zero_queue() {
        let result = PoolConfig::new(4, 0, 5_000);
        assert!(matches!(result, Err(PoolConfigError::InvalidQueueCapacity)));
    }

    #[test]
    fn test_pool_config_zero_timeout() {
        let result = PoolConfig::new(4, 10, 0);
        assert!(matches!(result, Err(PoolConfigError::InvalidTimeout)));
    }

    #[test]
    fn test_pool_config_with_defaults() {
        let config = PoolConfig::with_defaults(10).unwrap();
        assert_eq!(config.worker_count, 10);
        assert_eq!(config.max_pending, 10);
        assert_eq!(config.task_timeout_ms, 30_000);
    }
}
