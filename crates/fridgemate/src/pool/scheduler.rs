//! Round-robin scheduling with backpressure and a bounded wait.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::oneshot;

use fridgemate_core::error::{Result, ServiceError};
use fridgemate_core::pool::PoolConfig;

use super::worker::{Job, Worker};

/// How long callers are told to back off when the pool is saturated.
const RETRY_AFTER_SECS: u64 = 1;

/// Passive snapshot of pool load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub name: &'static str,
    pub worker_count: usize,
    pub workers_with_capacity: usize,
    pub queued: usize,
}

/// A pool of workers running operations with bounded queues.
pub struct WorkerPool {
    name: &'static str,
    workers: RwLock<Vec<Worker>>,
    next_worker: AtomicUsize,
    config: PoolConfig,
}

impl WorkerPool {
    /// Spawns `config.worker_count` workers on the current runtime.
    pub fn new(name: &'static str, config: PoolConfig) -> Self {
        let workers: Vec<_> = (0..config.worker_count)
            .map(|index| Worker::spawn(name, index, config.max_pending))
            .collect();

        tracing::info!(
            pool = name,
            worker_count = workers.len(),
            max_pending = config.max_pending,
            "Worker pool initialized"
        );

        Self {
            name,
            workers: RwLock::new(workers),
            next_worker: AtomicUsize::new(0),
            config,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Runs `task` on the next worker with room in its queue.
    ///
    /// Fails fast with `PoolSaturated` when every queue is full. Waiting for
    /// the result is bounded by the configured task timeout; a task that
    /// times out keeps running, its result is discarded.
    pub async fn run<F, T>(&self, task: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (response_tx, response_rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            // Send result back, ignoring if the caller gave up waiting.
            let _ = response_tx.send(task.await);
        });

        self.submit(job)?;

        let timeout = Duration::from_millis(self.config.task_timeout_ms);
        match tokio::time::timeout(timeout, response_rx).await {
            Ok(Ok(result)) => result,
            // The job dropped its sender without answering: it panicked.
            Ok(Err(_)) => Err(ServiceError::Internal("task panicked".to_string())),
            Err(_) => {
                tracing::warn!(
                    pool = self.name,
                    timeout_ms = self.config.task_timeout_ms,
                    "Task timed out"
                );
                Err(ServiceError::Timeout(self.config.task_timeout_ms))
            }
        }
    }

    /// Queues `job` on the first worker with capacity, starting round-robin.
    fn submit(&self, mut job: Job) -> Result<()> {
        let workers = self
            .workers
            .read()
            .map_err(|_| ServiceError::PoolClosed)?;
        if workers.is_empty() {
            return Err(ServiceError::PoolClosed);
        }

        let start = self.next_worker.fetch_add(1, Ordering::Relaxed);
        for offset in 0..workers.len() {
            let worker = &workers[(start + offset) % workers.len()];
            match worker.sender().try_send(job) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(returned)) => job = returned,
                Err(TrySendError::Closed(_)) => return Err(ServiceError::PoolClosed),
            }
        }

        tracing::warn!(pool = self.name, "Worker pool saturated");
        Err(ServiceError::PoolSaturated {
            retry_after_secs: RETRY_AFTER_SECS,
        })
    }

    /// Get pool statistics (passive - no I/O).
    pub fn stats(&self) -> PoolStats {
        let workers = match self.workers.read() {
            Ok(workers) => workers,
            Err(poisoned) => poisoned.into_inner(),
        };
        PoolStats {
            name: self.name,
            worker_count: workers.len(),
            workers_with_capacity: workers.iter().filter(|w| w.has_capacity()).count(),
            queued: workers.iter().map(Worker::queued).sum(),
        }
    }

    /// Stops accepting work and waits for queued jobs to finish.
    ///
    /// Calling it again is a no-op.
    pub async fn shutdown(&self) {
        let workers = match self.workers.write() {
            Ok(mut workers) => std::mem::take(&mut *workers),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        if workers.is_empty() {
            return;
        }

        for handle in workers.into_iter().map(Worker::into_handle) {
            if let Err(err) = handle.await {
                tracing::warn!(pool = self.name, error = %err, "Worker ended abnormally");
            }
        }
        tracing::info!(pool = self.name, "Worker pool shut down");
    }
}
