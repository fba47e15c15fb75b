//! Worker task management.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;

use futures_util::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A unit of work queued on a worker.
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A worker task draining its own bounded queue, one job at a time.
pub struct Worker {
    request_tx: mpsc::Sender<Job>,
    handle: JoinHandle<()>,
}

impl Worker {
    /// Spawn a new worker task on the current runtime.
    pub fn spawn(pool: &'static str, index: usize, max_pending: usize) -> Self {
        let (request_tx, mut request_rx) = mpsc::channel::<Job>(max_pending);

        let handle = tokio::spawn(async move {
            tracing::trace!(pool, worker = index, "Worker started");

            while let Some(job) = request_rx.recv().await {
                // A panicking job must not take the worker down with it.
                if AssertUnwindSafe(job).catch_unwind().await.is_err() {
                    tracing::error!(pool, worker = index, "Job panicked");
                }
            }

            tracing::trace!(pool, worker = index, "Worker shutting down");
        });

        Self { request_tx, handle }
    }

    pub fn sender(&self) -> &mpsc::Sender<Job> {
        &self.request_tx
    }

    /// Returns true if the worker can queue another job.
    pub fn has_capacity(&self) -> bool {
        self.request_tx.capacity() > 0
    }

    /// Jobs waiting in the queue.
    pub fn queued(&self) -> usize {
        self.request_tx.max_capacity() - self.request_tx.capacity()
    }

    /// Closes the queue and returns the task handle so the caller can wait
    /// for queued jobs to finish.
    pub fn into_handle(self) -> JoinHandle<()> {
        self.handle
    }
}
