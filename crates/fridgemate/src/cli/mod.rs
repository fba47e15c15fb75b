//! Command line surface.
//!
//! Every subcommand maps onto one service operation and produces a JSON
//! value; `main` prints it. Users are always shown as [`UserProfile`]s.
//!
//! [`UserProfile`]: crate::services::UserProfile

mod budgets;
mod notifications;
mod products;
mod recipes;
mod users;

use anyhow::Result;
use serde::Serialize;
use serde_json::{json, Value};

use crate::app::App;

/// FridgeMate - Track what is in your fridge, what it cost and what to cook
#[derive(Debug, clap::Parser)]
#[command(name = "fridgemate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Register, authenticate and maintain user accounts
    #[command(subcommand)]
    Users(users::UsersAction),

    /// Manage per-user spending budgets
    #[command(subcommand)]
    Budgets(budgets::BudgetsAction),

    /// Manage the products in a user's fridge
    #[command(subcommand)]
    Products(products::ProductsAction),

    /// Manage recipes
    #[command(subcommand)]
    Recipes(recipes::RecipesAction),

    /// Post and read user notifications
    #[command(subcommand)]
    Notifications(notifications::NotificationsAction),

    /// Show worker pool load of every service
    Stats,
}

/// Runs `command` against `app` and returns its JSON output.
pub async fn run(app: &App, command: Command) -> Result<Value> {
    match command {
        Command::Users(action) => users::run(app, action).await,
        Command::Budgets(action) => budgets::run(app, action).await,
        Command::Products(action) => products::run(app, action).await,
        Command::Recipes(action) => recipes::run(app, action).await,
        Command::Notifications(action) => notifications::run(app, action).await,
        Command::Stats => to_json(app.stats()),
    }
}

fn to_json(value: impl Serialize) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn deleted(count: u64) -> Result<Value> {
    Ok(json!({ "deleted": count }))
}
