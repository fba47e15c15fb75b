use serde::{Deserialize, Serialize};

use crate::record::{Field, Record, RecordId};

use super::validation::{validate_email, validate_password, validate_username};
use super::ValidationError;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    /// PHC-formatted password hash.
    pub password_hash: String,
    /// Token issued at registration; addresses the account in later calls.
    pub token: String,
    pub verified: bool,
}

impl User {
    /// Creates an unverified, not yet persisted user.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            id: RecordId::UNASSIGNED,
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            token: token.into(),
            verified: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserField {
    Id,
    Username,
    Email,
    Token,
}

impl Field for UserField {
    fn name(self) -> &'static str {
        match self {
            UserField::Id => "id",
            UserField::Username => "username",
            UserField::Email => "email",
            UserField::Token => "token",
        }
    }

    fn is_unique(self) -> bool {
        true
    }
}

impl Record for User {
    type Field = UserField;
    const KIND: &'static str = "user";
    const ID: UserField = UserField::Id;

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn keys(&self) -> Vec<(UserField, String)> {
        vec![
            (UserField::Id, self.id.to_string()),
            (UserField::Username, self.username.clone()),
            (UserField::Email, self.email.clone()),
            (UserField::Token, self.token.clone()),
        ]
    }
}

/// Input for registering a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Validates registration input.
pub fn validate_new_user(input: &NewUser) -> Result<(), ValidationError> {
    validate_username(&input.username)?;
    validate_email(&input.email)?;
    validate_password(&input.password)
}

/// Whether a login name should be matched against the email index.
pub fn is_email_login(name: &str) -> bool {
    name.contains('@')
}
