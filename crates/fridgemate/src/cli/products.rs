use anyhow::Result;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde_json::Value;

use fridgemate_core::entities::NewProduct;
use fridgemate_core::record::RecordId;

use crate::app::App;

use super::{deleted, to_json};

#[derive(Debug, clap::Subcommand)]
pub enum ProductsAction {
    /// Add a product to the fridge of TOKEN
    Add {
        token: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "other")]
        category: String,
        /// Format: YYYY-MM-DD
        #[arg(long, value_name = "DATE")]
        expiry: NaiveDate,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
        #[arg(long)]
        amount: BigDecimal,
    },

    /// Show one product
    Get { id: RecordId },

    /// List the products of TOKEN
    List { token: String },

    /// List the products of TOKEN that already expired
    Expired { token: String },

    /// List the products of TOKEN expiring today or tomorrow
    Expiring { token: String },

    /// Change how many units of a product are left
    SetQuantity { id: RecordId, quantity: u32 },

    /// Delete one product
    Delete { id: RecordId },

    /// Delete every product of TOKEN
    DeleteForOwner { token: String },

    /// Delete the expired products of TOKEN
    DeleteExpired { token: String },

    /// Delete every product
    DeleteAll,
}

pub async fn run(app: &App, action: ProductsAction) -> Result<Value> {
    let products = &app.products;
    match action {
        ProductsAction::Add {
            token,
            name,
            category,
            expiry,
            quantity,
            amount,
        } => {
            let input = NewProduct {
                name,
                category,
                expiry_date: expiry,
                quantity,
                amount,
            };
            to_json(products.add(&token, input).await?)
        }
        ProductsAction::Get { id } => to_json(products.get_by_id(id).await?),
        ProductsAction::List { token } => to_json(products.list_for_owner(&token).await?),
        ProductsAction::Expired { token } => to_json(products.expired(&token).await?),
        ProductsAction::Expiring { token } => to_json(products.expiring(&token).await?),
        ProductsAction::SetQuantity { id, quantity } => {
            to_json(products.set_quantity(id, quantity).await?)
        }
        ProductsAction::Delete { id } => to_json(products.delete_by_id(id).await?),
        ProductsAction::DeleteForOwner { token } => {
            deleted(products.delete_for_owner(&token).await?)
        }
        ProductsAction::DeleteExpired { token } => deleted(products.delete_expired(&token).await?),
        ProductsAction::DeleteAll => deleted(products.delete_all().await?),
    }
}
