//! Bounded worker pool running caller-facing operations.
//!
//! Each entity service owns one pool. Work is spread round-robin over a fixed
//! set of workers, each with a bounded queue; when every queue is full the
//! operation is refused with `PoolSaturated` instead of waiting.

mod scheduler;
mod worker;

pub use scheduler::{PoolStats, WorkerPool};
