use fridgemate_core::entities::{validate_new_recipe, validate_servings, NewRecipe, Recipe, RecipeField};
use fridgemate_core::error::Result;
use fridgemate_core::pool::PoolConfig;
use fridgemate_core::record::{Lookup, RecordId};

use crate::pool::{PoolStats, WorkerPool};
use crate::records::RecordStore;

use super::PooledStore;

pub struct RecipeService {
    recipes: PooledStore<Recipe>,
}

impl RecipeService {
    pub fn new(store: RecordStore<Recipe>, pool: PoolConfig) -> Self {
        Self::from_parts(PooledStore::new(store, WorkerPool::new("recipes", pool)))
    }

    pub(crate) fn from_parts(recipes: PooledStore<Recipe>) -> Self {
        Self { recipes }
    }

    pub async fn add(&self, input: NewRecipe) -> Result<Recipe> {
        validate_new_recipe(&input)?;
        self.recipes.create(Recipe::from(input)).await
    }

    pub async fn get_by_id(&self, id: RecordId) -> Result<Option<Recipe>> {
        self.recipes.get_by_id(id).await
    }

    pub async fn list_all(&self) -> Result<Vec<Recipe>> {
        self.recipes.list_all().await
    }

    pub async fn set_servings(&self, id: RecordId, servings: u32) -> Result<Recipe> {
        validate_servings(servings)?;
        self.recipes
            .update(by_id(id), move |recipe| {
                recipe.servings = servings;
                Ok(())
            })
            .await
    }

    pub async fn delete_by_id(&self, id: RecordId) -> Result<Option<Recipe>> {
        self.recipes.delete(by_id(id)).await
    }

    pub async fn delete_all(&self) -> Result<u64> {
        self.recipes.delete_all().await
    }

    pub fn stats(&self) -> PoolStats {
        self.recipes.stats()
    }

    pub async fn shutdown(&self) {
        self.recipes.shutdown().await;
    }
}

fn by_id(id: RecordId) -> Lookup<RecipeField> {
    Lookup::new(RecipeField::Id, id.to_string())
}
