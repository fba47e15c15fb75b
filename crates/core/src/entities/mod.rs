//! Record kinds managed by the cache: their key sets and input validation.

mod budget;
mod error;
mod notification;
mod product;
mod recipe;
mod user;
pub mod validation;

pub use budget::{validate_amount, Budget, BudgetError, BudgetField};
pub use error::ValidationError;
pub use notification::{
    older_than, validate_message, Notification, NotificationField, NotificationLevel,
    MESSAGE_MAX_LEN,
};
pub use product::{validate_new_product, validate_quantity, NewProduct, Product, ProductField};
pub use recipe::{validate_new_recipe, validate_servings, NewRecipe, Recipe, RecipeField};
pub use user::{is_email_login, validate_new_user, NewUser, User, UserField};
