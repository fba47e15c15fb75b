//! Password hashing and opaque user tokens.
//!
//! Passwords are stored as PHC-formatted Argon2id hashes. Tokens carry no
//! claims: they are random identifiers looked up through the user index.

use argon2::{
    password_hash::{
        self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};
use uuid::Uuid;

use fridgemate_core::error::{Result, ServiceError};
use fridgemate_core::token::TokenAuthority;

/// Prefix of every token issued by [`OpaqueTokenAuthority`].
pub const TOKEN_PREFIX: &str = "fm_";

const TOKEN_BODY_LEN: usize = 32;

/// Hash a password for storage using Argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(hashing_error)
}

fn hashing_error(err: password_hash::Error) -> ServiceError {
    ServiceError::Internal(format!("Password hashing failed: {err}"))
}

/// Verify a password against a stored hash.
///
/// A malformed stored hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            false
        }
    }
}

/// Issues `fm_` followed by 32 lowercase hex digits of a random UUID.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaqueTokenAuthority;

impl TokenAuthority for OpaqueTokenAuthority {
    fn issue(&self, _subject: &str) -> String {
        format!("{}{}", TOKEN_PREFIX, Uuid::new_v4().simple())
    }

    fn validate(&self, token: &str) -> bool {
        token.strip_prefix(TOKEN_PREFIX).is_some_and(|body| {
            body.len() == TOKEN_BODY_LEN
                && body
                    .bytes()
                    .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        })
    }
}
