use anyhow::Result;
use serde_json::Value;

use fridgemate_core::entities::NewRecipe;
use fridgemate_core::record::RecordId;

use crate::app::App;

use super::{deleted, to_json};

#[derive(Debug, clap::Subcommand)]
pub enum RecipesAction {
    /// Add a recipe
    Add {
        #[arg(long)]
        name: String,
        /// Words separated by ',' or ';', e.g. "flour, milk; eggs"
        #[arg(long)]
        ingredients: String,
        #[arg(long, default_value_t = 1)]
        servings: u32,
        #[arg(long)]
        instructions: String,
    },

    /// Show one recipe
    Get { id: RecordId },

    /// List every recipe
    List,

    /// Change how many servings a recipe makes
    SetServings { id: RecordId, servings: u32 },

    /// Delete one recipe
    Delete { id: RecordId },

    /// Delete every recipe
    DeleteAll,
}

pub async fn run(app: &App, action: RecipesAction) -> Result<Value> {
    let recipes = &app.recipes;
    match action {
        RecipesAction::Add {
            name,
            ingredients,
            servings,
            instructions,
        } => {
            let input = NewRecipe {
                name,
                ingredients,
                servings,
                instructions,
            };
            to_json(recipes.add(input).await?)
        }
        RecipesAction::Get { id } => to_json(recipes.get_by_id(id).await?),
        RecipesAction::List => to_json(recipes.list_all().await?),
        RecipesAction::SetServings { id, servings } => {
            to_json(recipes.set_servings(id, servings).await?)
        }
        RecipesAction::Delete { id } => to_json(recipes.delete_by_id(id).await?),
        RecipesAction::DeleteAll => deleted(recipes.delete_all().await?),
    }
}
