//! Caller-facing entity services.
//!
//! Each service validates input, then runs the record operation on its own
//! bounded worker pool through a [`PooledStore`]. Pools are owned by the
//! service and must be shut down with it.

mod budgets;
mod notifications;
mod products;
mod recipes;
mod users;

use std::future::Future;

use fridgemate_core::entities::ValidationError;
use fridgemate_core::error::{Result, ServiceError};
use fridgemate_core::record::{Lookup, Record, RecordId};
use fridgemate_core::token::TokenAuthority;

use crate::pool::{PoolStats, WorkerPool};
use crate::records::RecordStore;

pub use budgets::BudgetService;
pub use notifications::{NotificationService, Sweeper};
pub use products::{Clock, ProductService};
pub use recipes::RecipeService;
pub use users::{UserProfile, UserService};

/// A [`RecordStore`] whose operations run on a dedicated worker pool.
///
/// Every method submits one unit of work and waits for it under the pool's
/// backpressure and timeout policy.
pub struct PooledStore<R: Record> {
    store: RecordStore<R>,
    pool: WorkerPool,
}

impl<R: Record> PooledStore<R> {
    pub fn new(store: RecordStore<R>, pool: WorkerPool) -> Self {
        Self { store, pool }
    }

    pub async fn get(&self, field: R::Field, value: impl Into<String>) -> Result<Option<R>> {
        let lookup = self.store.lookup.clone();
        let value = value.into();
        self.pool
            .run(async move { Ok(lookup.lookup(field, &value).await?) })
            .await
    }

    pub async fn get_by_id(&self, id: RecordId) -> Result<Option<R>> {
        self.get(R::ID, id.to_string()).await
    }

    pub async fn list_all(&self) -> Result<Vec<R>> {
        let lookup = self.store.lookup.clone();
        self.pool
            .run(async move { Ok(lookup.list_all().await?) })
            .await
    }

    pub async fn list_by(&self, field: R::Field, value: impl Into<String>) -> Result<Vec<R>> {
        let lookup = self.store.lookup.clone();
        let value = value.into();
        self.pool
            .run(async move { Ok(lookup.list_by(field, &value).await?) })
            .await
    }

    pub async fn create(&self, record: R) -> Result<R> {
        let coordinator = self.store.coordinator.clone();
        self.pool
            .run(async move { coordinator.create(record).await })
            .await
    }

    pub async fn update<F>(&self, lookup: Lookup<R::Field>, mutate: F) -> Result<R>
    where
        F: FnOnce(&mut R) -> Result<()> + Send + 'static,
    {
        let coordinator = self.store.coordinator.clone();
        self.pool
            .run(async move { coordinator.update(&lookup, mutate).await })
            .await
    }

    pub async fn delete(&self, lookup: Lookup<R::Field>) -> Result<Option<R>> {
        let coordinator = self.store.coordinator.clone();
        self.pool
            .run(async move { coordinator.delete(&lookup).await })
            .await
    }

    /// Deletes the records with `field = value` that satisfy `predicate`.
    pub async fn delete_matching<P>(
        &self,
        field: R::Field,
        value: impl Into<String>,
        predicate: P,
    ) -> Result<u64>
    where
        P: Fn(&R) -> bool + Send + 'static,
    {
        let store = self.store.clone();
        let value = value.into();
        self.pool
            .run(async move {
                let records: Vec<R> = store
                    .lookup
                    .list_by(field, &value)
                    .await?
                    .into_iter()
                    .filter(|r| predicate(r))
                    .collect();
                store.coordinator.delete_many(&records).await
            })
            .await
    }

    pub async fn delete_many(&self, records: Vec<R>) -> Result<u64> {
        let coordinator = self.store.coordinator.clone();
        self.pool
            .run(async move { coordinator.delete_many(&records).await })
            .await
    }

    pub async fn delete_all(&self) -> Result<u64> {
        let coordinator = self.store.coordinator.clone();
        self.pool
            .run(async move { coordinator.delete_all().await })
            .await
    }

    /// Runs `work` against the store as a single pooled unit of work.
    pub async fn run<T, W, Fut>(&self, work: W) -> Result<T>
    where
        W: FnOnce(RecordStore<R>) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.pool.run(work(self.store.clone())).await
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}

/// Runs CPU-heavy `work` off the async runtime threads.
pub(crate) async fn blocking<T, W>(work: W) -> Result<T>
where
    W: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ServiceError::Internal(format!("Blocking task failed: {e}")))?
}

/// Rejects tokens the authority could not have issued.
pub(crate) fn check_token(tokens: &dyn TokenAuthority, token: &str) -> Result<()> {
    if tokens.validate(token) {
        Ok(())
    } else {
        Err(ValidationError::InvalidToken.into())
    }
}
