use bigdecimal::BigDecimal;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::record::{Field, Record, RecordId};

use super::budget::validate_amount;
use super::validation::validate_name;
use super::ValidationError;

/// A product stored in a user's fridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: RecordId,
    /// Token of the owning user.
    pub owner: String,
    pub name: String,
    pub category: String,
    pub expiry_date: NaiveDate,
    pub quantity: u32,
    pub added_date: NaiveDate,
    /// Price paid for the product.
    pub amount: BigDecimal,
}

impl Product {
    /// Returns true if the product expired before `today`.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date < today
    }

    /// Returns true if the product expires today or tomorrow.
    pub fn is_expiring(&self, today: NaiveDate) -> bool {
        let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
        self.expiry_date >= today && self.expiry_date <= tomorrow
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductField {
    Id,
    Owner,
}

impl Field for ProductField {
    fn name(self) -> &'static str {
        match self {
            ProductField::Id => "id",
            ProductField::Owner => "owner",
        }
    }

    fn is_unique(self) -> bool {
        matches!(self, ProductField::Id)
    }
}

impl Record for Product {
    type Field = ProductField;
    const KIND: &'static str = "product";
    const ID: ProductField = ProductField::Id;

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn keys(&self) -> Vec<(ProductField, String)> {
        vec![(ProductField::Id, self.id.to_string())]
    }

    fn tags(&self) -> Vec<(ProductField, String)> {
        vec![(ProductField::Owner, self.owner.clone())]
    }
}

/// Input for adding a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub expiry_date: NaiveDate,
    pub quantity: u32,
    pub amount: BigDecimal,
}

impl NewProduct {
    /// Builds the record owned by `owner`, added on `today`.
    pub fn into_product(self, owner: impl Into<String>, today: NaiveDate) -> Product {
        Product {
            id: RecordId::UNASSIGNED,
            owner: owner.into(),
            name: self.name,
            category: self.category,
            expiry_date: self.expiry_date,
            quantity: self.quantity,
            added_date: today,
            amount: self.amount,
        }
    }
}

/// Validates a product before it is added on `today`.
pub fn validate_new_product(input: &NewProduct, today: NaiveDate) -> Result<(), ValidationError> {
    validate_name("Product", &input.name, 100)?;
    validate_quantity(input.quantity)?;
    if input.expiry_date <= today {
        return Err(ValidationError::ExpiryNotInFuture);
    }
    validate_amount("Amount", &input.amount)
}

pub fn validate_quantity(quantity: u32) -> Result<(), ValidationError> {
    if quantity == 0 {
        return Err(ValidationError::NotPositive("Quantity"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn milk(expiry_date: NaiveDate) -> NewProduct {
        NewProduct {
            name: "Milk".to_string(),
            category: "dairy".to_string(),
            expiry_date,
            quantity: 2,
            amount: BigDecimal::from_str("1.99").unwrap(),
        }
    }

    #[test]
    fn test_validate_new_product() {
        let today = date(2024, 3, 10);
        assert!(validate_new_product(&milk(date(2024, 3, 11)), today).is_ok());
        assert_eq!(
            validate_new_product(&milk(today), today),
            Err(ValidationError::ExpiryNotInFuture)
        );

        let mut none = milk(date(2024, 3, 12));
        none.quantity = 0;
        assert_eq!(
            validate_new_product(&none, today),
            Err(ValidationError::NotPositive("Quantity"))
        );

        let mut free = milk(date(2024, 3, 12));
        free.amount = BigDecimal::from(0);
        assert_eq!(
            validate_new_product(&free, today),
            Err(ValidationError::NotPositive("Amount"))
        );
    }

    #[test]
    fn test_expiry_windows() {
        let today = date(2024, 3, 10);
        let product = |expiry| milk(expiry).into_product("fm_owner", date(2024, 3, 1));

        assert!(product(date(2024, 3, 9)).is_expired(today));
        assert!(!product(date(2024, 3, 10)).is_expired(today));

        assert!(product(date(2024, 3, 10)).is_expiring(today));
        assert!(product(date(2024, 3, 11)).is_expiring(today));
        assert!(!product(date(2024, 3, 12)).is_expiring(today));
        assert!(!product(date(2024, 3, 9)).is_expiring(today));
    }

    #[test]
    fn test_owner_is_a_tag_not_a_key() {
        let product = milk(date(2024, 3, 11)).into_product("fm_owner", date(2024, 3, 1));
        assert_eq!(product.keys(), vec![(ProductField::Id, "0".to_string())]);
        assert_eq!(
            product.tags(),
            vec![(ProductField::Owner, "fm_owner".to_string())]
        );
        assert!(!ProductField::Owner.is_unique());
    }
}
