use std::sync::LazyLock;

use regex::Regex;

use crate::record::RecordId;

use super::ValidationError;

static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]{3,15}$").expect("Invalid username regex"));

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

/// Comma or semicolon separated words, e.g. "eggs, milk; flour".
static INGREDIENTS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\w\s]+([,;\s]+[\w\s]+)*)$").expect("Invalid ingredients regex")
});

pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 30;

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_REGEX.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError::InvalidUsername(username.to_string()))
    }
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if (PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPassword)
    }
}

pub fn validate_ingredients(ingredients: &str) -> Result<(), ValidationError> {
    if !ingredients.trim().is_empty() && INGREDIENTS_REGEX.is_match(ingredients) {
        Ok(())
    } else {
        Err(ValidationError::InvalidIngredients)
    }
}

/// Validates a non-empty name of at most `max` characters.
pub fn validate_name(entity: &'static str, name: &str, max: usize) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName(entity));
    }
    if name.chars().count() > max {
        return Err(ValidationError::NameTooLong { entity, max });
    }
    Ok(())
}

/// Parses a caller-supplied primary key.
pub fn parse_id(value: &str) -> Result<RecordId, ValidationError> {
    match value.parse::<RecordId>() {
        Ok(id) if id.is_assigned() => Ok(id),
        _ => Err(ValidationError::InvalidId(value.to_string())),
    }
}
