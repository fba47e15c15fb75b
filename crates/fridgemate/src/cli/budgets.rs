use anyhow::Result;
use bigdecimal::BigDecimal;
use serde_json::{json, Value};

use fridgemate_core::record::RecordId;

use crate::app::App;

use super::{deleted, to_json};

#[derive(Debug, clap::Subcommand)]
pub enum BudgetsAction {
    /// Open a budget for a user
    Create { user_id: RecordId, total: BigDecimal },

    /// Show a budget by id, or by owner with --user
    Get {
        #[arg(required_unless_present = "user", conflicts_with = "user")]
        id: Option<RecordId>,
        #[arg(long)]
        user: Option<RecordId>,
    },

    /// Show what is left of a user's budget
    Remaining { user_id: RecordId },

    /// Record an expense against a user's budget
    Expense { user_id: RecordId, amount: BigDecimal },

    /// Replace the total of a user's budget
    SetLimit { user_id: RecordId, limit: BigDecimal },

    /// List every budget
    List,

    /// Delete a budget by id, or by owner with --user
    Delete {
        #[arg(required_unless_present = "user", conflicts_with = "user")]
        id: Option<RecordId>,
        #[arg(long)]
        user: Option<RecordId>,
    },

    /// Delete every budget
    DeleteAll,
}

pub async fn run(app: &App, action: BudgetsAction) -> Result<Value> {
    let budgets = &app.budgets;
    match action {
        BudgetsAction::Create { user_id, total } => to_json(budgets.create(user_id, total).await?),
        BudgetsAction::Get { id, user } => match (id, user) {
            (Some(id), _) => to_json(budgets.get_by_id(id).await?),
            (None, Some(user)) => to_json(budgets.get_by_user(user).await?),
            (None, None) => Ok(Value::Null),
        },
        BudgetsAction::Remaining { user_id } => {
            let remaining = budgets.remaining(user_id).await?;
            Ok(json!({ "user_id": user_id, "remaining": remaining }))
        }
        BudgetsAction::Expense { user_id, amount } => {
            to_json(budgets.add_expense(user_id, amount).await?)
        }
        BudgetsAction::SetLimit { user_id, limit } => {
            to_json(budgets.set_limit(user_id, limit).await?)
        }
        BudgetsAction::List => to_json(budgets.list_all().await?),
        BudgetsAction::Delete { id, user } => match (id, user) {
            (Some(id), _) => to_json(budgets.delete_by_id(id).await?),
            (None, Some(user)) => to_json(budgets.delete_by_user(user).await?),
            (None, None) => Ok(Value::Null),
        },
        BudgetsAction::DeleteAll => deleted(budgets.delete_all().await?),
    }
}
