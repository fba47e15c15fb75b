use anyhow::Result;
use serde_json::Value;

use fridgemate_core::entities::NewUser;
use fridgemate_core::record::RecordId;

use crate::app::App;
use crate::services::UserProfile;

use super::{deleted, to_json};

#[derive(Debug, clap::Subcommand)]
pub enum UsersAction {
    /// Register a new, unverified user
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "FRIDGEMATE_PASSWORD")]
        password: String,
    },

    /// Check a password; NAME is a username or an email
    Login {
        name: String,
        #[arg(long, env = "FRIDGEMATE_PASSWORD")]
        password: String,
    },

    /// Show one user
    Get(UserKey),

    /// List every user
    List,

    /// Mark a user as verified (or not)
    Verify {
        token: String,
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        verified: bool,
    },

    /// Replace a user's password
    ChangePassword {
        token: String,
        #[arg(long, env = "FRIDGEMATE_PASSWORD")]
        password: String,
    },

    /// Move a user to a new email; verification is reset
    ChangeEmail { token: String, email: String },

    /// Delete one user
    Delete(UserKey),

    /// Delete every user
    DeleteAll,
}

/// Exactly one unique key addressing a user.
#[derive(Debug, clap::Args)]
#[group(required = true, multiple = false)]
pub struct UserKey {
    #[arg(long)]
    id: Option<RecordId>,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    token: Option<String>,
}

pub async fn run(app: &App, action: UsersAction) -> Result<Value> {
    let users = &app.users;
    match action {
        UsersAction::Register {
            username,
            email,
            password,
        } => {
            let user = users
                .register(NewUser {
                    username,
                    email,
                    password,
                })
                .await?;
            to_json(UserProfile::from(user))
        }
        UsersAction::Login { name, password } => {
            to_json(UserProfile::from(users.login(&name, &password).await?))
        }
        UsersAction::Get(key) => {
            let user = match key {
                UserKey { id: Some(id), .. } => users.get_by_id(id).await?,
                UserKey {
                    username: Some(username),
                    ..
                } => users.get_by_username(&username).await?,
                UserKey {
                    email: Some(email), ..
                } => users.get_by_email(&email).await?,
                UserKey {
                    token: Some(token), ..
                } => users.get_by_token(&token).await?,
                _ => None,
            };
            to_json(user.map(UserProfile::from))
        }
        UsersAction::List => {
            let profiles: Vec<UserProfile> = users
                .list_all()
                .await?
                .into_iter()
                .map(UserProfile::from)
                .collect();
            to_json(profiles)
        }
        UsersAction::Verify { token, verified } => {
            to_json(UserProfile::from(users.set_verified(&token, verified).await?))
        }
        UsersAction::ChangePassword { token, password } => to_json(UserProfile::from(
            users.change_password(&token, &password).await?,
        )),
        UsersAction::ChangeEmail { token, email } => {
            to_json(UserProfile::from(users.change_email(&token, &email).await?))
        }
        UsersAction::Delete(key) => {
            let user = match key {
                UserKey { id: Some(id), .. } => users.delete_by_id(id).await?,
                UserKey {
                    username: Some(username),
                    ..
                } => users.delete_by_username(&username).await?,
                UserKey {
                    email: Some(email), ..
                } => users.delete_by_email(&email).await?,
                UserKey {
                    token: Some(token), ..
                } => users.delete_by_token(&token).await?,
                _ => None,
            };
            to_json(user.map(UserProfile::from))
        }
        UsersAction::DeleteAll => deleted(users.delete_all().await?),
    }
}
