use std::sync::Arc;

use serde::Serialize;

use fridgemate_core::entities::validation::{validate_email, validate_password, validate_username};
use fridgemate_core::entities::{is_email_login, validate_new_user, NewUser, User, UserField};
use fridgemate_core::error::{Result, ServiceError};
use fridgemate_core::pool::PoolConfig;
use fridgemate_core::record::{Lookup, RecordId};
use fridgemate_core::token::TokenAuthority;

use crate::credentials::{hash_password, verify_password};
use crate::pool::{PoolStats, WorkerPool};
use crate::records::RecordStore;

use super::{blocking, check_token, PooledStore};

/// A user as shown to callers, without the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    pub token: String,
    pub verified: bool,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            token: user.token,
            verified: user.verified,
        }
    }
}

/// Registration, login and account maintenance.
pub struct UserService {
    users: PooledStore<User>,
    tokens: Arc<dyn TokenAuthority>,
}

impl UserService {
    pub fn new(store: RecordStore<User>, tokens: Arc<dyn TokenAuthority>, pool: PoolConfig) -> Self {
        Self::from_parts(PooledStore::new(store, WorkerPool::new("users", pool)), tokens)
    }

    pub(crate) fn from_parts(users: PooledStore<User>, tokens: Arc<dyn TokenAuthority>) -> Self {
        Self { users, tokens }
    }

    /// Registers an unverified user and issues its token.
    ///
    /// Hashing runs inside the pooled unit of work, on a blocking thread.
    pub async fn register(&self, input: NewUser) -> Result<User> {
        validate_new_user(&input)?;
        let token = self.tokens.issue(&input.username);
        let NewUser {
            username,
            email,
            password,
        } = input;

        let user = self
            .users
            .run(move |store| async move {
                let password_hash = blocking(move || hash_password(&password)).await?;
                store
                    .coordinator
                    .create(User::new(username, email, password_hash, token))
                    .await
            })
            .await?;
        tracing::info!(id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Authenticates by username or email.
    ///
    /// The password is checked on every call, including cache hits.
    pub async fn login(&self, name: &str, password: &str) -> Result<User> {
        let field = if is_email_login(name) {
            validate_email(name)?;
            UserField::Email
        } else {
            validate_username(name)?;
            UserField::Username
        };

        let value = name.to_string();
        let password = password.to_string();
        let user = self
            .users
            .run(move |store| async move {
                let Some(user) = store.lookup.lookup(field, &value).await? else {
                    return Ok(None);
                };
                let hash = user.password_hash.clone();
                let matches = blocking(move || Ok(verify_password(&password, &hash))).await?;
                Ok::<_, ServiceError>(matches.then_some(user))
            })
            .await?;

        user.ok_or_else(|| {
            tracing::debug!(name, "Login refused");
            ServiceError::Rejected("Invalid credentials".to_string())
        })
    }

    pub async fn get_by_id(&self, id: RecordId) -> Result<Option<User>> {
        self.users.get_by_id(id).await
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        validate_username(username)?;
        self.users.get(UserField::Username, username).await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        validate_email(email)?;
        self.users.get(UserField::Email, email).await
    }

    pub async fn get_by_token(&self, token: &str) -> Result<Option<User>> {
        check_token(self.tokens.as_ref(), token)?;
        self.users.get(UserField::Token, token).await
    }

    pub async fn list_all(&self) -> Result<Vec<User>> {
        self.users.list_all().await
    }

    pub async fn set_verified(&self, token: &str, verified: bool) -> Result<User> {
        check_token(self.tokens.as_ref(), token)?;
        self.users
            .update(Lookup::new(UserField::Token, token), move |user| {
                user.verified = verified;
                Ok(())
            })
            .await
    }

    pub async fn change_password(&self, token: &str, password: &str) -> Result<User> {
        check_token(self.tokens.as_ref(), token)?;
        validate_password(password)?;
        let lookup = Lookup::new(UserField::Token, token);
        let password = password.to_string();

        self.users
            .run(move |store| async move {
                let password_hash = blocking(move || hash_password(&password)).await?;
                store
                    .coordinator
                    .update(&lookup, move |user| {
                        user.password_hash = password_hash;
                        Ok(())
                    })
                    .await
            })
            .await
    }

    /// Moves the account to a new email address, which has to be verified again.
    pub async fn change_email(&self, token: &str, email: &str) -> Result<User> {
        check_token(self.tokens.as_ref(), token)?;
        validate_email(email)?;
        let email = email.to_string();

        self.users
            .update(Lookup::new(UserField::Token, token), move |user| {
                if user.email != email {
                    user.email = email;
                    user.verified = false;
                }
                Ok(())
            })
            .await
    }

    pub async fn delete_by_id(&self, id: RecordId) -> Result<Option<User>> {
        self.users
            .delete(Lookup::new(UserField::Id, id.to_string()))
            .await
    }

    pub async fn delete_by_username(&self, username: &str) -> Result<Option<User>> {
        validate_username(username)?;
        self.users
            .delete(Lookup::new(UserField::Username, username))
            .await
    }

    pub async fn delete_by_email(&self, email: &str) -> Result<Option<User>> {
        validate_email(email)?;
        self.users.delete(Lookup::new(UserField::Email, email)).await
    }

    pub async fn delete_by_token(&self, token: &str) -> Result<Option<User>> {
        check_token(self.tokens.as_ref(), token)?;
        self.users.delete(Lookup::new(UserField::Token, token)).await
    }

    pub async fn delete_all(&self) -> Result<u64> {
        self.users.delete_all().await
    }

    pub fn stats(&self) -> PoolStats {
        self.users.stats()
    }

    pub async fn shutdown(&self) {
        self.users.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fridgemate_core::entities::ValidationError;

    use crate::credentials::OpaqueTokenAuthority;
    use crate::test_support::Fixture;

    fn service(fixture: &Fixture<User>) -> UserService {
        UserService::from_parts(fixture.pooled("users"), Arc::new(OpaqueTokenAuthority))
    }

    fn alice() -> NewUser {
        NewUser {
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password: "secret1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password_and_issues_token() {
        let fixture = Fixture::<User>::new();
        let users = service(&fixture);

        let user = users.register(alice()).await.unwrap();

        assert_eq!(user.id, RecordId(1));
        assert!(!user.verified);
        assert_ne!(user.password_hash, "secret1");
        assert!(OpaqueTokenAuthority.validate(&user.token));
        assert_eq!(users.get_by_token(&user.token).await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn test_password_hashing_runs_under_the_pool_timeout() {
        let fixture = Fixture::<User>::new();
        let users = service(&fixture);
        users.register(alice()).await.unwrap();

        // Argon2 takes far longer than a millisecond.
        let impatient = UserService::from_parts(
            PooledStore::new(
                fixture.store(),
                WorkerPool::new("users", PoolConfig::new(1, 1, 1).unwrap()),
            ),
            Arc::new(OpaqueTokenAuthority),
        );

        let mut bob = alice();
        bob.username = "bobby".to_string();
        bob.email = "b@x.com".to_string();
        assert_eq!(impatient.register(bob).await, Err(ServiceError::Timeout(1)));
        assert_eq!(
            impatient.login("alice", "secret1").await,
            Err(ServiceError::Timeout(1))
        );

        impatient.shutdown().await;
        assert_eq!(users.login("alice", "secret1").await.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_input_before_storage() {
        let fixture = Fixture::<User>::new();
        let users = service(&fixture);

        let mut input = alice();
        input.email = "not-an-email".to_string();
        let result = users.register(input).await;

        assert_eq!(
            result,
            Err(ServiceError::Validation(ValidationError::InvalidEmail(
                "not-an-email".to_string()
            )))
        );
        assert_eq!(fixture.repository.read_calls(), 0);
        assert_eq!(fixture.repository.save_calls(), 0);
    }

    #[tokio::test]
    async fn test_register_duplicate_username_conflicts() {
        let fixture = Fixture::<User>::new();
        let users = service(&fixture);
        users.register(alice()).await.unwrap();

        let mut input = alice();
        input.email = "other@x.com".to_string();
        let result = users.register(input).await;

        assert!(matches!(
            result,
            Err(ServiceError::Conflict {
                field: "username",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_login_by_username_or_email() {
        let fixture = Fixture::<User>::new();
        let users = service(&fixture);
        let registered = users.register(alice()).await.unwrap();

        assert_eq!(users.login("alice", "secret1").await.unwrap(), registered);
        assert_eq!(users.login("a@x.com", "secret1").await.unwrap(), registered);
    }

    #[tokio::test]
    async fn test_login_checks_password_on_cache_hit() {
        let fixture = Fixture::<User>::new();
        let users = service(&fixture);
        users.register(alice()).await.unwrap();
        assert!(fixture.cache.contains("user-by-username: alice").await);

        let result = users.login("alice", "wrong-password").await;

        assert_eq!(
            result,
            Err(ServiceError::Rejected("Invalid credentials".to_string()))
        );
    }

    #[tokio::test]
    async fn test_login_unknown_user_is_rejected() {
        let fixture = Fixture::<User>::new();
        let users = service(&fixture);

        let result = users.login("nobody", "secret1").await;

        assert!(matches!(result, Err(ServiceError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_malformed_token_is_rejected_before_lookup() {
        let fixture = Fixture::<User>::new();
        let users = service(&fixture);

        let result = users.get_by_token("not-a-token").await;

        assert_eq!(result, Err(ValidationError::InvalidToken.into()));
        assert_eq!(fixture.cache.get_calls(), 0);
    }

    #[tokio::test]
    async fn test_change_email_resets_verification() {
        let fixture = Fixture::<User>::new();
        let users = service(&fixture);
        let user = users.register(alice()).await.unwrap();
        users.set_verified(&user.token, true).await.unwrap();

        let updated = users.change_email(&user.token, "new@x.com").await.unwrap();

        assert_eq!(updated.email, "new@x.com");
        assert!(!updated.verified);
        assert_eq!(users.get_by_email("a@x.com").await.unwrap(), None);
        assert_eq!(
            users.get_by_username("alice").await.unwrap(),
            Some(updated)
        );
    }

    #[tokio::test]
    async fn test_change_password() {
        let fixture = Fixture::<User>::new();
        let users = service(&fixture);
        let user = users.register(alice()).await.unwrap();

        users.change_password(&user.token, "another1").await.unwrap();

        assert!(users.login("alice", "secret1").await.is_err());
        assert!(users.login("alice", "another1").await.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_validates_length() {
        let fixture = Fixture::<User>::new();
        let users = service(&fixture);
        let user = users.register(alice()).await.unwrap();

        let result = users.change_password(&user.token, "short").await;

        assert_eq!(result, Err(ValidationError::InvalidPassword.into()));
    }

    #[tokio::test]
    async fn test_update_of_unknown_token_is_not_found() {
        let fixture = Fixture::<User>::new();
        let users = service(&fixture);
        let token = OpaqueTokenAuthority.issue("ghost");

        let result = users.set_verified(&token, true).await;

        assert!(matches!(
            result,
            Err(ServiceError::NotFound {
                entity_type: "user",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_delete_by_each_key() {
        let fixture = Fixture::<User>::new();
        let users = service(&fixture);
        let alice = users.register(alice()).await.unwrap();

        let deleted = users.delete_by_email("a@x.com").await.unwrap();
        assert_eq!(deleted, Some(alice.clone()));
        assert_eq!(users.get_by_token(&alice.token).await.unwrap(), None);
        assert_eq!(users.get_by_id(alice.id).await.unwrap(), None);

        assert_eq!(users.delete_by_username("alice").await.unwrap(), None);
        assert_eq!(users.delete_by_id(alice.id).await.unwrap(), None);
        assert_eq!(users.delete_by_token(&alice.token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_all() {
        let fixture = Fixture::<User>::new();
        let users = service(&fixture);
        users.register(alice()).await.unwrap();
        users
            .register(NewUser {
                username: "bobby".to_string(),
                email: "b@x.com".to_string(),
                password: "secret2".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(users.delete_all().await.unwrap(), 2);
        assert!(users.list_all().await.unwrap().is_empty());
        assert_eq!(users.delete_all().await.unwrap(), 0);
    }

    #[test]
    fn test_profile_hides_password_hash() {
        let user = User::new("alice", "a@x.com", "$argon2id$secret", "fm_1");
        let json = serde_json::to_string(&UserProfile::from(user)).unwrap();

        assert!(!json.contains("argon2"));
        assert!(json.contains("\"username\":\"alice\""));
    }
}
