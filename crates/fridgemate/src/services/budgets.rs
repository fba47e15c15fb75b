use std::sync::Arc;

use bigdecimal::BigDecimal;

use fridgemate_core::entities::{validate_amount, Budget, BudgetField};
use fridgemate_core::error::{Result, ServiceError};
use fridgemate_core::events::{topic, EventEmitter};
use fridgemate_core::pool::PoolConfig;
use fridgemate_core::record::{Lookup, Record, RecordId};

use crate::pool::{PoolStats, WorkerPool};
use crate::records::RecordStore;

use super::PooledStore;

/// Per-user spending budgets.
///
/// Successful mutations are announced by the record engine; refused ones
/// are announced here, on the same topic.
pub struct BudgetService {
    budgets: PooledStore<Budget>,
    emitter: Arc<dyn EventEmitter>,
}

impl BudgetService {
    pub fn new(store: RecordStore<Budget>, emitter: Arc<dyn EventEmitter>, pool: PoolConfig) -> Self {
        Self::from_parts(PooledStore::new(store, WorkerPool::new("budgets", pool)), emitter)
    }

    pub(crate) fn from_parts(budgets: PooledStore<Budget>, emitter: Arc<dyn EventEmitter>) -> Self {
        Self { budgets, emitter }
    }

    /// Opens a budget of `total` for `user_id`. A user holds at most one budget.
    pub async fn create(&self, user_id: RecordId, total: BigDecimal) -> Result<Budget> {
        validate_amount("Total", &total)?;
        let result = self.budgets.create(Budget::new(user_id, total)).await;
        self.announce_failure(user_id, "create", &result);
        result
    }

    pub async fn get_by_id(&self, id: RecordId) -> Result<Option<Budget>> {
        self.budgets.get_by_id(id).await
    }

    pub async fn get_by_user(&self, user_id: RecordId) -> Result<Option<Budget>> {
        self.budgets
            .get(BudgetField::UserId, user_id.to_string())
            .await
    }

    pub async fn remaining(&self, user_id: RecordId) -> Result<Option<BigDecimal>> {
        Ok(self.get_by_user(user_id).await?.map(|b| b.remaining))
    }

    /// Records an expense; refused when it would overdraw the budget.
    pub async fn add_expense(&self, user_id: RecordId, amount: BigDecimal) -> Result<Budget> {
        validate_amount("Amount", &amount)?;
        let result = self
            .budgets
            .update(by_user(user_id), move |budget| {
                budget
                    .apply_expense(&amount)
                    .map_err(|e| ServiceError::Rejected(e.to_string()))
            })
            .await;
        self.announce_failure(user_id, "expense", &result);
        result
    }

    /// Replaces the total; refused when below what was already spent.
    pub async fn set_limit(&self, user_id: RecordId, limit: BigDecimal) -> Result<Budget> {
        validate_amount("Limit", &limit)?;
        let result = self
            .budgets
            .update(by_user(user_id), move |budget| {
                budget
                    .apply_limit(&limit)
                    .map_err(|e| ServiceError::Rejected(e.to_string()))
            })
            .await;
        self.announce_failure(user_id, "limit", &result);
        result
    }

    pub async fn list_all(&self) -> Result<Vec<Budget>> {
        self.budgets.list_all().await
    }

    pub async fn delete_by_id(&self, id: RecordId) -> Result<Option<Budget>> {
        self.budgets
            .delete(Lookup::new(BudgetField::Id, id.to_string()))
            .await
    }

    pub async fn delete_by_user(&self, user_id: RecordId) -> Result<Option<Budget>> {
        self.budgets.delete(by_user(user_id)).await
    }

    pub async fn delete_all(&self) -> Result<u64> {
        self.budgets.delete_all().await
    }

    pub fn stats(&self) -> PoolStats {
        self.budgets.stats()
    }

    pub async fn shutdown(&self) {
        self.budgets.shutdown().await;
    }

    fn announce_failure(&self, user_id: RecordId, action: &str, result: &Result<Budget>) {
        let reason = match result {
            Ok(_) => return,
            Err(ServiceError::Rejected(reason)) => reason.clone(),
            Err(ServiceError::Conflict { .. }) => "budget already exists".to_string(),
            Err(ServiceError::NotFound { .. }) => "no budget".to_string(),
            Err(_) => return,
        };
        tracing::info!(user_id = %user_id, action, %reason, "Budget change refused");
        self.emitter.publish(
            &topic(Budget::KIND),
            &format!("budget {} for user {} refused: {}", action, user_id, reason),
        );
    }
}

fn by_user(user_id: RecordId) -> Lookup<BudgetField> {
    Lookup::new(BudgetField::UserId, user_id.to_string())
}
