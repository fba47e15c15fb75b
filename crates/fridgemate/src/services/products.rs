use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use fridgemate_core::entities::{
    validate_new_product, validate_quantity, NewProduct, Product, ProductField,
};
use fridgemate_core::error::Result;
use fridgemate_core::pool::PoolConfig;
use fridgemate_core::record::{Lookup, RecordId};
use fridgemate_core::token::TokenAuthority;

use crate::pool::{PoolStats, WorkerPool};
use crate::records::RecordStore;

use super::{check_token, PooledStore};

/// Source of the current date.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Products kept in each user's fridge, addressed by owner token.
pub struct ProductService {
    products: PooledStore<Product>,
    tokens: Arc<dyn TokenAuthority>,
    today: Clock,
}

impl ProductService {
    pub fn new(
        store: RecordStore<Product>,
        tokens: Arc<dyn TokenAuthority>,
        pool: PoolConfig,
    ) -> Self {
        Self::from_parts(
            PooledStore::new(store, WorkerPool::new("products", pool)),
            tokens,
        )
    }

    pub(crate) fn from_parts(products: PooledStore<Product>, tokens: Arc<dyn TokenAuthority>) -> Self {
        Self {
            products,
            tokens,
            today: Arc::new(|| Utc::now().date_naive()),
        }
    }

    /// Replaces the clock used for expiry checks.
    pub fn with_clock(mut self, today: Clock) -> Self {
        self.today = today;
        self
    }

    /// Adds a product to the fridge of `token`. Expiry must be after today.
    pub async fn add(&self, token: &str, input: NewProduct) -> Result<Product> {
        check_token(self.tokens.as_ref(), token)?;
        let today = (self.today)();
        validate_new_product(&input, today)?;

        self.products
            .create(input.into_product(token, today))
            .await
    }

    pub async fn get_by_id(&self, id: RecordId) -> Result<Option<Product>> {
        self.products.get_by_id(id).await
    }

    pub async fn list_for_owner(&self, token: &str) -> Result<Vec<Product>> {
        check_token(self.tokens.as_ref(), token)?;
        self.products.list_by(ProductField::Owner, token).await
    }

    /// Products of `token` whose expiry date has passed.
    pub async fn expired(&self, token: &str) -> Result<Vec<Product>> {
        let today = (self.today)();
        let mut products = self.list_for_owner(token).await?;
        products.retain(|p| p.is_expired(today));
        Ok(products)
    }

    /// Products of `token` expiring today or tomorrow.
    pub async fn expiring(&self, token: &str) -> Result<Vec<Product>> {
        let today = (self.today)();
        let mut products = self.list_for_owner(token).await?;
        products.retain(|p| p.is_expiring(today));
        Ok(products)
    }

    pub async fn set_quantity(&self, id: RecordId, quantity: u32) -> Result<Product> {
        validate_quantity(quantity)?;
        self.products
            .update(by_id(id), move |product| {
                product.quantity = quantity;
                Ok(())
            })
            .await
    }

    pub async fn delete_by_id(&self, id: RecordId) -> Result<Option<Product>> {
        self.products.delete(by_id(id)).await
    }

    pub async fn delete_for_owner(&self, token: &str) -> Result<u64> {
        check_token(self.tokens.as_ref(), token)?;
        self.products
            .delete_matching(ProductField::Owner, token, |_| true)
            .await
    }

    pub async fn delete_expired(&self, token: &str) -> Result<u64> {
        check_token(self.tokens.as_ref(), token)?;
        let today = (self.today)();
        self.products
            .delete_matching(ProductField::Owner, token, move |p| p.is_expired(today))
            .await
    }

    pub async fn delete_all(&self) -> Result<u64> {
        self.products.delete_all().await
    }

    pub fn stats(&self) -> PoolStats {
        self.products.stats()
    }

    pub async fn shutdown(&self) {
        self.products.shutdown().await;
    }
}

fn by_id(id: RecordId) -> Lookup<ProductField> {
    Lookup::new(ProductField::Id, id.to_string())
}
