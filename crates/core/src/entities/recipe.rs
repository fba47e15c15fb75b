use serde::{Deserialize, Serialize};

use crate::record::{Field, Record, RecordId};

use super::validation::{validate_ingredients, validate_name};
use super::ValidationError;

pub const RECIPE_NAME_MAX_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecordId,
    pub name: String,
    pub ingredients: String,
    pub servings: u32,
    pub instructions: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipeField {
    Id,
}

impl Field for RecipeField {
    fn name(self) -> &'static str {
        "id"
    }

    fn is_unique(self) -> bool {
        true
    }
}

impl Record for Recipe {
    type Field = RecipeField;
    const KIND: &'static str = "recipe";
    const ID: RecipeField = RecipeField::Id;

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn keys(&self) -> Vec<(RecipeField, String)> {
        vec![(RecipeField::Id, self.id.to_string())]
    }
}

/// Input for adding a recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRecipe {
    pub name: String,
    pub ingredients: String,
    pub servings: u32,
    pub instructions: String,
}

impl From<NewRecipe> for Recipe {
    fn from(input: NewRecipe) -> Self {
        Self {
            id: RecordId::UNASSIGNED,
            name: input.name,
            ingredients: input.ingredients,
            servings: input.servings,
            instructions: input.instructions,
        }
    }
}

pub fn validate_new_recipe(input: &NewRecipe) -> Result<(), ValidationError> {
    validate_name("Recipe", &input.name, RECIPE_NAME_MAX_LEN)?;
    validate_ingredients(&input.ingredients)?;
    validate_servings(input.servings)?;
    if input.instructions.trim().is_empty() {
        return Err(ValidationError::EmptyInstructions);
    }
    Ok(())
}

pub fn validate_servings(servings: u32) -> Result<(), ValidationError> {
    if servings == 0 {
        return Err(ValidationError::NotPositive("Servings"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pancakes() -> NewRecipe {
        NewRecipe {
            name: "Pancakes".to_string(),
            ingredients: "flour, eggs, milk".to_string(),
            servings: 4,
            instructions: "Mix and fry.".to_string(),
        }
    }

    #[test]
    fn test_validate_new_recipe() {
        assert!(validate_new_recipe(&pancakes()).is_ok());

        let mut long = pancakes();
        long.name = "p".repeat(RECIPE_NAME_MAX_LEN + 1);
        assert!(matches!(
            validate_new_recipe(&long),
            Err(ValidationError::NameTooLong { .. })
        ));

        let mut odd = pancakes();
        odd.ingredients = "flour | eggs".to_string();
        assert_eq!(
            validate_new_recipe(&odd),
            Err(ValidationError::InvalidIngredients)
        );

        let mut empty = pancakes();
        empty.instructions = " ".to_string();
        assert_eq!(
            validate_new_recipe(&empty),
            Err(ValidationError::EmptyInstructions)
        );
    }

    #[test]
    fn test_new_recipe_is_unassigned() {
        let recipe = Recipe::from(pancakes());
        assert_eq!(recipe.id, RecordId::UNASSIGNED);
        assert_eq!(recipe.servings, 4);
    }
}
