use thiserror::Error;

/// Errors raised when validating caller input for any record kind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid username: {0} (3-15 letters, digits, '.', '_' or '-')")]
    InvalidUsername(String),
    #[error("Invalid email: {0}")]
    InvalidEmail(String),
    #[error("Password must be between 6 and 30 characters")]
    InvalidPassword,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("{0} must be greater than 0")]
    NotPositive(&'static str),
    #[error("Expiry date must be after today")]
    ExpiryNotInFuture,
    #[error("{0} name cannot be empty")]
    EmptyName(&'static str),
    #[error("{entity} name too long (max {max} characters)")]
    NameTooLong { entity: &'static str, max: usize },
    #[error("Ingredients must be a list of words separated by ',' or ';'")]
    InvalidIngredients,
    #[error("Instructions cannot be empty")]
    EmptyInstructions,
    #[error("Notification message cannot be empty")]
    EmptyMessage,
    #[error("Notification message too long (max {0} characters)")]
    MessageTooLong(usize),
    #[error("Unknown notification level: {0}")]
    UnknownLevel(String),
}
